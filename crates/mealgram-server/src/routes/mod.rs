//! Route handlers and router assembly.

mod analyze;
mod health;
mod profile;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub use analyze::{AnalyzeRequest, AnalyzeResponse};

/// Build the application router.
///
/// `/health` is open; everything under `/api` goes through the
/// authentication gate via the `TelegramAuth` extractor in each
/// handler.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/profile", get(profile::profile))
        .route("/api/food/analyze", post(analyze::analyze))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
