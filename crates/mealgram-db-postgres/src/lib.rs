//! PostgreSQL storage backend for the Mealgram server.
//!
//! Provides persistent storage for:
//!
//! - Users (resolved on every successful authentication, keyed by
//!   telegram id)
//! - The durable cache tier (`ai_cache` table)
//!
//! # Example
//!
//! ```ignore
//! use mealgram_db_postgres::PostgresStorage;
//!
//! let storage = PostgresStorage::connect("postgres://localhost/mealgram").await?;
//! storage.init_schema().await?;
//!
//! let users = storage.users();   // implements mealgram_auth::UserStorage
//! let cache = storage.cache();   // implements mealgram_cache::CacheStorage
//! ```

pub mod cache;
pub mod user;

use std::sync::Arc;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

pub use cache::PostgresCacheStorage;
pub use user::PostgresUserStorage;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

// =============================================================================
// PostgreSQL Storage
// =============================================================================

/// PostgreSQL storage root.
///
/// Holds the connection pool and hands out the adapter types that
/// implement the auth and cache storage traits.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    /// Create storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create storage by connecting to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx_core::Error> {
        use sqlx_core::pool::PoolOptions;
        let pool = PoolOptions::<Postgres>::new().connect(database_url).await?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Create the tables this backend needs if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if a DDL statement fails.
    pub async fn init_schema(&self) -> Result<(), sqlx_core::Error> {
        sqlx_core::query::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                telegram_id BIGINT UNIQUE NOT NULL,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                language_code TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx_core::query::query(
            r#"
            CREATE TABLE IF NOT EXISTS ai_cache (
                cache_key TEXT PRIMARY KEY,
                response_data JSONB NOT NULL,
                expires_at TIMESTAMPTZ NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        tracing::info!("Database schema initialized");
        Ok(())
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get user storage operations.
    #[must_use]
    pub fn users(&self) -> PostgresUserStorage {
        PostgresUserStorage::new(Arc::clone(&self.pool))
    }

    /// Get durable cache storage operations.
    #[must_use]
    pub fn cache(&self) -> PostgresCacheStorage {
        PostgresCacheStorage::new(Arc::clone(&self.pool))
    }
}
