//! User storage trait and the persisted user record.
//!
//! The auth crate defines the contract; backends (see
//! `mealgram-db-postgres`) provide the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AuthError;
use crate::init_data::TelegramUser;

/// A stored user record, resolved on every successful authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedUser {
    /// Internal record identifier.
    pub id: Uuid,
    /// Platform-scoped Telegram user id (unique key).
    pub telegram_id: i64,
    /// Telegram username, if any.
    pub username: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// IETF language tag.
    pub language_code: Option<String>,
    /// When the record was first created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the profile fields were last refreshed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Durable storage for user records.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Create or update the record for a verified identity.
    ///
    /// Keyed by telegram id: an existing record has its mutable profile
    /// fields (username, names, locale) refreshed while any extended
    /// fields already stored stay untouched. Returns the full resulting
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `Persistence` if the record cannot be written or read
    /// back.
    async fn upsert(&self, identity: &TelegramUser) -> Result<PersistedUser, AuthError>;
}
