//! Authentication middleware for axum.
//!
//! [`TelegramAuth`] is the authentication gate: it runs the signature
//! verifier, the replay guard, and the user upsert as a single pass/fail
//! decision in front of every protected handler.

mod auth;
mod error;

pub use auth::{AuthState, INIT_DATA_HEADER, TelegramAuth};
pub use error::AuthRejection;
