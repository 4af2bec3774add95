//! Durable cache tier contract.
//!
//! The service talks to the durable tier only through [`CacheStorage`];
//! backends (see `mealgram-db-postgres`) provide the implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

// =============================================================================
// Error Types
// =============================================================================

/// A durable-tier fault.
///
/// These never reach cache callers; the service recovers them as
/// misses (reads) or volatile-only writes (stores) and logs them.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The storage backend failed.
    #[error("Cache storage error: {message}")]
    Storage {
        /// Description of the backend failure.
        message: String,
    },
}

impl CacheError {
    /// Create a `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

// =============================================================================
// Cache Record
// =============================================================================

/// A durable cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Unique content-derived key.
    pub cache_key: String,
    /// The memoized computation result.
    pub response_data: Value,
    /// Validity bound; the record is dead once this is in the past.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// When the record was written.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Cache Storage
// =============================================================================

/// Durable keyed storage with TTL-based validity.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Point lookup by key, filtered to records whose `expires_at` has
    /// not passed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    async fn get_valid(&self, key: &str) -> Result<Option<CacheRecord>, CacheError>;

    /// Insert or replace the record for its `cache_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    async fn upsert(&self, record: CacheRecord) -> Result<(), CacheError>;

    /// Bulk delete every record whose validity has elapsed; returns how
    /// many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    async fn delete_expired(&self) -> Result<u64, CacheError>;
}
