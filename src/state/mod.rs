//! Shared application state: the storage handle, both caches, and the
//! degraded-mode view derived from them.

/// Per-question hint cache.
pub mod hints;
/// Question-pool cache and rotation logic.
pub mod pool;

use std::sync::Arc;

use rand::rngs::StdRng;
use tokio::sync::RwLock;

use crate::{
    config::AppConfig, dao::question_store::QuestionStore, error::ServiceError,
    state::hints::HintCache, state::pool::PoolCache,
};

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state owning the caches and the storage handle.
///
/// The caches live here rather than in a hidden global so their lifecycle is
/// tied to server startup and shutdown, and handlers reach them through this
/// one handle. Degraded mode is not tracked separately: the application is
/// degraded exactly while no question store is installed.
pub struct AppState {
    config: AppConfig,
    question_store: RwLock<Option<Arc<dyn QuestionStore>>>,
    pool: PoolCache,
    hints: HintCache,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let pool = PoolCache::new(config.draw_size, config.variety_refresh_threshold);
        let hints = HintCache::new(config.hint_ttl);
        Arc::new(Self {
            config,
            question_store: RwLock::new(None),
            pool,
            hints,
        })
    }

    /// Construct state with an injected random source for deterministic tests.
    pub fn with_rng(config: AppConfig, rng: StdRng) -> SharedState {
        let pool = PoolCache::with_rng(config.draw_size, config.variety_refresh_threshold, rng);
        let hints = HintCache::new(config.hint_ttl);
        Arc::new(Self {
            config,
            question_store: RwLock::new(None),
            pool,
            hints,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current question store, if one is installed.
    pub async fn question_store(&self) -> Option<Arc<dyn QuestionStore>> {
        let guard = self.question_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the question store or fail with the degraded-mode error.
    pub async fn require_question_store(&self) -> Result<Arc<dyn QuestionStore>, ServiceError> {
        self.question_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new question store implementation and leave degraded mode.
    pub async fn install_question_store(&self, store: Arc<dyn QuestionStore>) {
        let mut guard = self.question_store.write().await;
        *guard = Some(store);
    }

    /// Remove the current question store and enter degraded mode.
    pub async fn clear_question_store(&self) {
        let mut guard = self.question_store.write().await;
        guard.take();
    }

    /// Whether the application currently runs without a storage backend.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.question_store.read().await;
        guard.is_none()
    }

    /// Question-pool cache.
    pub fn pool_cache(&self) -> &PoolCache {
        &self.pool
    }

    /// Per-question hint cache.
    pub fn hint_cache(&self) -> &HintCache {
        &self.hints
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::{config::AppConfig, dao::question_store::testing::StubStore};

    #[tokio::test]
    async fn degraded_mode_tracks_store_presence() {
        let state = AppState::with_rng(AppConfig::default(), StdRng::seed_from_u64(0));
        assert!(state.is_degraded().await);
        assert!(matches!(
            state.require_question_store().await,
            Err(ServiceError::Degraded)
        ));

        let store = StubStore::with_questions(Vec::new());
        state.install_question_store(Arc::new(store)).await;
        assert!(!state.is_degraded().await);
        assert!(state.require_question_store().await.is_ok());

        state.clear_question_store().await;
        assert!(state.is_degraded().await);
    }
}
