//! Authenticated user profile endpoint.

use axum::Json;

use mealgram_auth::{PersistedUser, middleware::TelegramAuth};

/// Returns the resolved user record for the authenticated request.
pub async fn profile(TelegramAuth(user): TelegramAuth) -> Json<PersistedUser> {
    Json(user)
}
