//! # mealgram-auth
//!
//! Telegram Mini App authentication for the Mealgram server.
//!
//! Every protected request carries a signed init-data payload issued by
//! Telegram. This crate verifies that payload and resolves the platform
//! user behind it:
//!
//! - [`InitData`] parses the URL-encoded payload into an ordered field
//!   map and builds the canonical check string.
//! - [`verifier`] validates the HMAC-SHA256 signature and the 24-hour
//!   freshness bound, yielding a [`TelegramUser`].
//! - [`ReplayGuard`] refuses a second admission of the same signature
//!   within a bounded window.
//! - [`middleware`] composes the above with a [`UserStorage`] upsert
//!   into a single axum extractor, [`middleware::TelegramAuth`].
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use mealgram_auth::middleware::{AuthState, TelegramAuth};
//!
//! async fn profile(TelegramAuth(user): TelegramAuth) -> String {
//!     format!("Hello, {}!", user.telegram_id)
//! }
//!
//! let app = Router::new()
//!     .route("/api/profile", get(profile))
//!     .with_state(auth_state);
//! ```

mod error;
mod init_data;
pub mod middleware;
mod replay;
mod storage;
pub mod verifier;

pub use error::AuthError;
pub use init_data::{InitData, TelegramUser};
pub use replay::ReplayGuard;
pub use storage::{PersistedUser, UserStorage};
pub use verifier::verify;

/// Type alias for an auth result.
pub type AuthResult<T> = Result<T, AuthError>;
