//! Volatile in-process cache tier.

use std::collections::HashMap;

use serde_json::Value;
use time::{Duration, OffsetDateTime};
use tokio::sync::RwLock;

struct MemoryEntry {
    value: Value,
    expires_at: OffsetDateTime,
}

/// The volatile tier: a process-wide map with a fixed validity window.
///
/// Entries are never proactively swept; a stale entry is ignored on
/// read and overwritten on the next insert for its key.
pub struct MemoryTier {
    ttl: Duration,
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryTier {
    /// Create a tier whose entries live for `ttl` after insertion.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a key, ignoring entries whose window has elapsed.
    pub async fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.expires_at <= OffsetDateTime::now_utc() {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Insert a value with this tier's own validity window.
    pub async fn insert(&self, key: &str, value: Value) {
        let entry = MemoryEntry {
            value,
            expires_at: OffsetDateTime::now_utc() + self.ttl,
        };
        self.entries.write().await.insert(key.to_owned(), entry);
    }

    /// Number of entries held, stale ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no entries are held.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
