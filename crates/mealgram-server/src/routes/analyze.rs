//! Meal analysis endpoint.
//!
//! Estimating nutrition is the expensive call this server exists to
//! memoize: the handler derives a content key from the request and
//! reads through the two-tier cache before touching the estimator.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use mealgram_auth::middleware::TelegramAuth;
use mealgram_cache::derive_key;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Free-text description of the meal.
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    /// The nutrition estimate.
    pub data: Value,
    /// Whether the estimate came from the cache.
    pub cached: bool,
}

pub async fn analyze(
    State(state): State<AppState>,
    TelegramAuth(user): TelegramAuth,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let description = request.description.trim();
    if description.is_empty() {
        return Err(ApiError::invalid_request("description must not be empty"));
    }

    let key = derive_key("food", &json!({ "description": description }));

    if let Some(data) = state.cache.get(&key).await {
        return Ok(Json(AnalyzeResponse { data, cached: true }));
    }

    tracing::info!(telegram_id = user.telegram_id, "Running nutrition estimation");
    let data = state.estimator.estimate(description).await?;
    state
        .cache
        .set(&key, data.clone(), state.config.cache.food_ttl_hours)
        .await;

    Ok(Json(AnalyzeResponse {
        data,
        cached: false,
    }))
}
