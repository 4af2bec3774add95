//! HTTP server for the Mealgram Mini App backend.
//!
//! Wires the authentication gate (`mealgram-auth`), the two-tier result
//! cache (`mealgram-cache`), and the PostgreSQL backend
//! (`mealgram-db-postgres`) into an axum application.

pub mod config;
pub mod error;
pub mod estimator;
pub mod observability;
pub mod routes;
pub mod state;

pub use config::{AppConfig, load_config};
pub use state::AppState;
