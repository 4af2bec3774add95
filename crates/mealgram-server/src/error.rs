//! Handler-level error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::estimator::EstimatorError;

/// Errors a route handler can surface to the client.
///
/// Authentication failures never reach this type; the gate rejects
/// before the handler runs.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The estimation backend failed.
    #[error("Estimation failed")]
    Estimator(#[from] EstimatorError),

    /// The request body is unusable.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },
}

impl ApiError {
    /// Create an `InvalidRequest` error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Estimator(e) => {
                tracing::error!(error = %e, "Estimation failed");
                (StatusCode::BAD_GATEWAY, "Analysis failed".to_string())
            }
            ApiError::InvalidRequest { message } => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimator_error_maps_to_bad_gateway() {
        let response = ApiError::from(EstimatorError::failed("backend down")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_request_maps_to_bad_request() {
        let response = ApiError::invalid_request("empty description").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
