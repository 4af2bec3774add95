//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;

use mealgram_auth::middleware::AuthState;
use mealgram_cache::CacheService;

use crate::config::AppConfig;
use crate::estimator::NutritionEstimator;

/// State shared by every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<AppConfig>,

    /// Authentication gate state.
    pub auth: AuthState,

    /// Two-tier result cache.
    pub cache: Arc<CacheService>,

    /// Nutrition estimation backend.
    pub estimator: Arc<dyn NutritionEstimator>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
