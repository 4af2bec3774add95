//! User storage.
//!
//! One row per Telegram user, keyed by `telegram_id`. Authentication
//! upserts on every request, refreshing the mutable profile fields
//! while leaving anything else stored on the row untouched.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use uuid::Uuid;

use mealgram_auth::{AuthError, PersistedUser, TelegramUser, UserStorage};

use crate::PgPool;

type UserTuple = (
    Uuid,
    i64,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    OffsetDateTime,
    OffsetDateTime,
);

fn from_tuple(row: UserTuple) -> PersistedUser {
    PersistedUser {
        id: row.0,
        telegram_id: row.1,
        username: row.2,
        first_name: row.3,
        last_name: row.4,
        language_code: row.5,
        created_at: row.6,
        updated_at: row.7,
    }
}

/// PostgreSQL-backed [`UserStorage`].
#[derive(Debug, Clone)]
pub struct PostgresUserStorage {
    pool: Arc<PgPool>,
}

impl PostgresUserStorage {
    /// Create a new user storage over a connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStorage for PostgresUserStorage {
    async fn upsert(&self, identity: &TelegramUser) -> Result<PersistedUser, AuthError> {
        let row: UserTuple = query_as(
            r#"
            INSERT INTO users (telegram_id, username, first_name, last_name, language_code)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (telegram_id) DO UPDATE
            SET username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                language_code = EXCLUDED.language_code,
                updated_at = NOW()
            RETURNING id, telegram_id, username, first_name, last_name, language_code,
                      created_at, updated_at
            "#,
        )
        .bind(identity.id)
        .bind(&identity.username)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.language_code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            tracing::error!(telegram_id = identity.id, error = %e, "User upsert failed");
            AuthError::persistence(e.to_string())
        })?;

        Ok(from_tuple(row))
    }
}
