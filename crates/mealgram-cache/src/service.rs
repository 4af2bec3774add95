//! The two-tier cache service.
//!
//! Owns read-through, write-through, and expiry sweeping across the
//! volatile tier and a durable [`CacheStorage`] backend.

use std::sync::Arc;

use serde_json::Value;
use time::{Duration, OffsetDateTime};

use crate::memory::MemoryTier;
use crate::storage::{CacheRecord, CacheStorage};

/// Fixed validity window of the volatile tier.
///
/// Intentionally independent of the durable TTL a caller passes to
/// [`CacheService::set`]; see the design notes on the resulting
/// inconsistency windows.
pub const MEMORY_TTL: Duration = Duration::minutes(5);

/// Two-tier result cache.
///
/// Reads check the volatile tier first and fall back to the durable
/// tier, backfilling the volatile tier on a durable hit. Writes go to
/// both tiers with independent expirations. Durable faults degrade to
/// misses or volatile-only writes and are only ever logged.
pub struct CacheService {
    memory: MemoryTier,
    durable: Arc<dyn CacheStorage>,
}

impl CacheService {
    /// Create a service over a durable backend, with the standard
    /// volatile window.
    #[must_use]
    pub fn new(durable: Arc<dyn CacheStorage>) -> Self {
        Self::with_memory_ttl(durable, MEMORY_TTL)
    }

    /// Create a service with an explicit volatile window.
    ///
    /// Mostly useful in tests, where a zero window makes the volatile
    /// tier permanently stale.
    #[must_use]
    pub fn with_memory_ttl(durable: Arc<dyn CacheStorage>, memory_ttl: Duration) -> Self {
        Self {
            memory: MemoryTier::new(memory_ttl),
            durable,
        }
    }

    /// Look up a key across both tiers.
    ///
    /// A returned value is never expired at the moment of the read: the
    /// volatile tier checks its own window and the durable lookup is
    /// validity-filtered. A durable fault is treated as a miss.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.memory.get(key).await {
            tracing::debug!(key, "Cache hit (memory)");
            return Some(value);
        }

        match self.durable.get_valid(key).await {
            Ok(Some(record)) => {
                tracing::debug!(key, "Cache hit (durable)");
                // Backfill with the volatile tier's own window, not the
                // durable record's remaining validity.
                self.memory.insert(key, record.response_data.clone()).await;
                Some(record.response_data)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Durable cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a value in both tiers.
    ///
    /// The volatile entry lives for the fixed [`MEMORY_TTL`] window;
    /// the durable record lives for `ttl_hours`. A durable fault leaves
    /// the volatile write in place and never reaches the caller.
    pub async fn set(&self, key: &str, value: Value, ttl_hours: i64) {
        self.memory.insert(key, value.clone()).await;

        let now = OffsetDateTime::now_utc();
        let record = CacheRecord {
            cache_key: key.to_owned(),
            response_data: value,
            expires_at: now + Duration::hours(ttl_hours),
            created_at: now,
        };
        match self.durable.upsert(record).await {
            Ok(()) => tracing::debug!(key, ttl_hours, "Cached"),
            Err(e) => {
                tracing::warn!(key, error = %e, "Durable cache write failed, kept volatile only");
            }
        }
    }

    /// Delete expired durable records; returns how many were removed.
    ///
    /// Volatile entries are never swept; they expire lazily on read.
    pub async fn cleanup(&self) -> u64 {
        match self.durable.delete_expired().await {
            Ok(removed) => {
                tracing::info!(removed, "Cache cleanup completed");
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache cleanup failed");
                0
            }
        }
    }

    /// Spawn the periodic durable sweep.
    pub fn spawn_cleanup(
        self: &Arc<Self>,
        period: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so the sweep
            // runs one full period after startup.
            interval.tick().await;
            loop {
                interval.tick().await;
                service.cleanup().await;
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CacheError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    // -------------------------------------------------------------------------
    // Mock Storage
    // -------------------------------------------------------------------------

    #[derive(Default)]
    struct MockCacheStorage {
        records: Mutex<HashMap<String, CacheRecord>>,
        fail: AtomicBool,
        get_calls: AtomicUsize,
    }

    impl MockCacheStorage {
        fn seed(&self, key: &str, value: Value, validity: Duration) {
            let now = OffsetDateTime::now_utc();
            let record = CacheRecord {
                cache_key: key.to_owned(),
                response_data: value,
                expires_at: now + validity,
                created_at: now,
            };
            self.records.lock().unwrap().insert(key.to_owned(), record);
        }
    }

    #[async_trait]
    impl CacheStorage for MockCacheStorage {
        async fn get_valid(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(CacheError::storage("connection refused"));
            }
            let records = self.records.lock().unwrap();
            Ok(records
                .get(key)
                .filter(|r| r.expires_at >= OffsetDateTime::now_utc())
                .cloned())
        }

        async fn upsert(&self, record: CacheRecord) -> Result<(), CacheError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CacheError::storage("connection refused"));
            }
            self.records
                .lock()
                .unwrap()
                .insert(record.cache_key.clone(), record);
            Ok(())
        }

        async fn delete_expired(&self) -> Result<u64, CacheError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(CacheError::storage("connection refused"));
            }
            let now = OffsetDateTime::now_utc();
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|_, r| r.expires_at >= now);
            Ok((before - records.len()) as u64)
        }
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_set_then_get_served_from_memory() {
        let storage = Arc::new(MockCacheStorage::default());
        let cache = CacheService::new(storage.clone());

        cache.set("k", json!({ "kcal": 320 }), 1).await;
        let hit = cache.get("k").await;

        assert_eq!(hit, Some(json!({ "kcal": 320 })));
        // Memory answered; the durable tier was never read.
        assert_eq!(storage.get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_durable_hit_after_memory_window_elapses() {
        let storage = Arc::new(MockCacheStorage::default());
        // Zero memory window: every volatile entry is stale on read.
        let cache = CacheService::with_memory_ttl(storage.clone(), Duration::ZERO);

        cache.set("k", json!("v"), 1).await;
        let hit = cache.get("k").await;

        assert_eq!(hit, Some(json!("v")));
        assert_eq!(storage.get_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_durable_hit_backfills_memory() {
        let storage = Arc::new(MockCacheStorage::default());
        let cache = CacheService::new(storage.clone());
        storage.seed("k", json!("v"), Duration::hours(1));

        assert_eq!(cache.get("k").await, Some(json!("v")));

        // Kill the durable tier; the backfilled volatile entry still
        // answers.
        storage.fail.store(true, Ordering::SeqCst);
        assert_eq!(cache.get("k").await, Some(json!("v")));
        assert_eq!(storage.get_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_miss_on_never_written_key() {
        let storage = Arc::new(MockCacheStorage::default());
        let cache = CacheService::new(storage);

        assert_eq!(cache.get("unknown").await, None);
    }

    #[tokio::test]
    async fn test_expired_durable_record_is_a_miss() {
        let storage = Arc::new(MockCacheStorage::default());
        let cache = CacheService::with_memory_ttl(storage.clone(), Duration::ZERO);
        storage.seed("k", json!("v"), Duration::hours(-1));

        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_durable_fault_on_get_is_a_miss() {
        let storage = Arc::new(MockCacheStorage::default());
        storage.fail.store(true, Ordering::SeqCst);
        let cache = CacheService::new(storage);

        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_durable_fault_on_set_keeps_volatile_value() {
        let storage = Arc::new(MockCacheStorage::default());
        storage.fail.store(true, Ordering::SeqCst);
        let cache = CacheService::new(storage.clone());

        cache.set("k", json!("v"), 1).await;

        assert_eq!(cache.get("k").await, Some(json!("v")));
        assert!(storage.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_records() {
        let storage = Arc::new(MockCacheStorage::default());
        let cache = CacheService::new(storage.clone());
        storage.seed("dead", json!(1), Duration::hours(-1));
        storage.seed("live", json!(2), Duration::hours(1));

        assert_eq!(cache.cleanup().await, 1);
        assert_eq!(storage.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_fault_reports_zero() {
        let storage = Arc::new(MockCacheStorage::default());
        storage.fail.store(true, Ordering::SeqCst);
        let cache = CacheService::new(storage);

        assert_eq!(cache.cleanup().await, 0);
    }
}
