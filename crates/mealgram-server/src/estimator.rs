//! Nutrition estimation interface.
//!
//! The actual inference runs in an external service; the server only
//! depends on this trait. [`HeuristicEstimator`] is the built-in
//! deterministic fallback used when no inference backend is configured,
//! which also keeps the analyze route testable offline.

use async_trait::async_trait;
use serde_json::{Value, json};

/// A nutrition estimation error, surfaced as a handler-level failure
/// (never an authentication or cache failure).
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// The estimation backend failed or returned garbage.
    #[error("Estimation failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

impl EstimatorError {
    /// Create a `Failed` error.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Estimates nutrition facts for a described meal.
#[async_trait]
pub trait NutritionEstimator: Send + Sync {
    /// Produce a nutrition estimate for a free-text meal description.
    ///
    /// The result is an opaque JSON document; the server caches it
    /// as-is and returns it to the client unmodified.
    ///
    /// # Errors
    ///
    /// Returns an error if the estimation backend fails.
    async fn estimate(&self, description: &str) -> Result<Value, EstimatorError>;
}

/// Deterministic keyword-free fallback estimator.
///
/// Scales a generic meal profile by the number of food words in the
/// description. Placeholder quality on purpose; deployments point the
/// server at a real inference backend instead.
#[derive(Debug, Default, Clone)]
pub struct HeuristicEstimator;

#[async_trait]
impl NutritionEstimator for HeuristicEstimator {
    async fn estimate(&self, description: &str) -> Result<Value, EstimatorError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(EstimatorError::failed("empty meal description"));
        }

        let items = description
            .split([',', '+'])
            .filter(|s| !s.trim().is_empty())
            .count()
            .max(1) as i64;

        Ok(json!({
            "source": "heuristic",
            "items": items,
            "calories": 250 * items,
            "protein_g": 12 * items,
            "fat_g": 9 * items,
            "carbs_g": 30 * items,
        }))
    }
}

// =============================================================================
// Tests
// =============================================================================
