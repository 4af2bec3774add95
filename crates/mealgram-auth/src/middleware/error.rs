//! Rejection responses for the authentication gate.
//!
//! Every authentication failure, whatever its internal stage, is
//! surfaced to the caller as the same unauthorized outcome. Internal
//! detail is attached only when the state opts in (non-production).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

/// A failed authentication, ready to be rendered as a response.
#[derive(Debug)]
pub struct AuthRejection {
    error: AuthError,
    expose_detail: bool,
}

impl AuthRejection {
    /// Wrap an auth error for the response path.
    #[must_use]
    pub fn new(error: AuthError, expose_detail: bool) -> Self {
        Self {
            error,
            expose_detail,
        }
    }

    /// The underlying error.
    #[must_use]
    pub fn error(&self) -> &AuthError {
        &self.error
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        if self.error.is_persistence() {
            tracing::error!(error = %self.error, "Authentication failed on persistence");
        }

        let body = if self.expose_detail {
            json!({
                "error": "Authentication failed",
                "detail": self.error.to_string(),
            })
        } else {
            json!({ "error": "Authentication failed" })
        };

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

// =============================================================================
// Tests
// =============================================================================
