//! Health check endpoint.

use axum::Json;
use serde_json::{Value, json};
use time::OffsetDateTime;

pub async fn health() -> Json<Value> {
    let timestamp = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
