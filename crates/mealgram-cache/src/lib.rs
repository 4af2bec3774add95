//! # mealgram-cache
//!
//! Two-tier result cache for expensive external computations
//! (nutrition inference, composition analysis, meal plans).
//!
//! A volatile in-process tier answers repeat lookups within a short
//! fixed window; a durable tier (any [`CacheStorage`] backend) keeps
//! results across restarts for a caller-chosen number of hours. Keys
//! are derived from the content of the cacheable input, so identical
//! requests share one computation.
//!
//! The cache never fails from the caller's point of view: a durable
//! tier fault degrades to a miss on read and to a volatile-only write
//! on store, reported to the log and nowhere else.
//!
//! # Example
//!
//! ```ignore
//! use mealgram_cache::{CacheService, derive_key};
//! use serde_json::json;
//!
//! let key = derive_key("food", &json!({ "description": "oatmeal" }));
//! if let Some(hit) = cache.get(&key).await {
//!     return hit;
//! }
//! let result = run_inference().await?;
//! cache.set(&key, result.clone(), 24).await;
//! ```

mod key;
mod memory;
mod service;
mod storage;

pub use key::derive_key;
pub use memory::MemoryTier;
pub use service::{CacheService, MEMORY_TTL};
pub use storage::{CacheError, CacheRecord, CacheStorage};

/// Type alias for a cache storage result.
pub type CacheResult<T> = Result<T, CacheError>;
