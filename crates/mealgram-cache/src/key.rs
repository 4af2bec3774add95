//! Content-derived cache keys.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Derive a deterministic cache key from a prefix and a cacheable
/// input.
///
/// The key is `{prefix}:{hex(sha256(json))}` over the canonical JSON
/// rendering of the input. Identical inputs always yield the same key;
/// object keys serialize in sorted order, so field ordering at the call
/// site does not matter. This is a deduplication key, not a security
/// boundary.
#[must_use]
pub fn derive_key(prefix: &str, input: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.to_string().as_bytes());
    format!("{prefix}:{}", hex::encode(hasher.finalize()))
}

// =============================================================================
// Tests
// =============================================================================
