//! Durable cache tier storage.
//!
//! Backs `mealgram-cache` with the `ai_cache` table: point lookups are
//! validity-filtered in SQL, writes upsert by key, and the sweep is a
//! single bulk delete.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;

use mealgram_cache::{CacheError, CacheRecord, CacheStorage};

use crate::PgPool;

/// PostgreSQL-backed [`CacheStorage`].
#[derive(Debug, Clone)]
pub struct PostgresCacheStorage {
    pool: Arc<PgPool>,
}

impl PostgresCacheStorage {
    /// Create a new cache storage over a connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStorage for PostgresCacheStorage {
    async fn get_valid(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
        let row: Option<(String, serde_json::Value, OffsetDateTime, OffsetDateTime)> = query_as(
            r#"
            SELECT cache_key, response_data, expires_at, created_at
            FROM ai_cache
            WHERE cache_key = $1
              AND expires_at >= NOW()
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| CacheError::storage(e.to_string()))?;

        Ok(row.map(|(cache_key, response_data, expires_at, created_at)| CacheRecord {
            cache_key,
            response_data,
            expires_at,
            created_at,
        }))
    }

    async fn upsert(&self, record: CacheRecord) -> Result<(), CacheError> {
        query(
            r#"
            INSERT INTO ai_cache (cache_key, response_data, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cache_key) DO UPDATE
            SET response_data = EXCLUDED.response_data,
                expires_at = EXCLUDED.expires_at,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(&record.cache_key)
        .bind(&record.response_data)
        .bind(record.expires_at)
        .bind(record.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| CacheError::storage(e.to_string()))?;

        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, CacheError> {
        let result = query(
            r#"
            DELETE FROM ai_cache
            WHERE expires_at < NOW()
            "#,
        )
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| CacheError::storage(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
