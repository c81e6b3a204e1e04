//! Pool fetching strategies and the question-draw algorithm.
//!
//! A draw serves from the cached primary pool whenever possible; the only
//! blocking storage round trip is the cold-start fetch. Background refreshes
//! are fire-and-forget and report back through the pool cache.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::{
    dao::{
        models::{QuestionEntity, QuestionRecord},
        question_store::{QUESTION_TEXT_FIELD, QuestionStore},
        storage::StorageError,
    },
    dto::question::QuestionDto,
    error::ServiceError,
    state::{
        SharedState,
        pool::{FetchStrategy, Pool},
    },
};

/// Draw at most the configured batch of unseen questions for one game start.
///
/// Rotation and the background-refresh trigger run on every call; neither
/// blocks the response. An empty corpus yields an empty batch, not an error.
pub async fn draw_questions(
    state: &SharedState,
    history: Vec<String>,
) -> Result<Vec<QuestionDto>, ServiceError> {
    let cache = state.pool_cache();

    // Cold start: the one point where the caller blocks on storage.
    if cache.primary().await.is_none() {
        let store = state.require_question_store().await?;
        let strategy = cache.choose_cold_start_strategy().await;
        let anchor = cache.anchor_for(strategy, now_ms()).await;
        let questions =
            fetch_pool(store.as_ref(), strategy, anchor, state.config().pool_size).await?;
        info!(
            strategy = ?strategy,
            size = questions.len(),
            "primary pool fetched on cold start"
        );
        cache.install_primary(Pool::new(questions, strategy)).await;
    }

    let plan = cache.prepare_draw(&history).await;
    if plan.rotated {
        debug!(
            variety_score = plan.variety_score,
            "promoted background pool over a stale primary"
        );
    }
    if let Some(strategy) = plan.refresh {
        spawn_background_refresh(state.clone(), strategy);
    }

    let Some(pool) = plan.snapshot else {
        return Ok(Vec::new());
    };

    let picked = cache.select(&pool, &history).await;
    Ok(picked.into_iter().map(Into::into).collect())
}

/// Fetch one pool batch using the given strategy and project every row to the
/// lean shape before it leaves this function.
pub(crate) async fn fetch_pool(
    store: &dyn QuestionStore,
    strategy: FetchStrategy,
    anchor: Option<String>,
    pool_size: usize,
) -> Result<Vec<QuestionRecord>, StorageError> {
    let entities = match strategy {
        FetchStrategy::AnchorId => store.query_ordered_by_id(anchor, pool_size).await?,
        FetchStrategy::AnchorText => {
            let start_at = anchor.unwrap_or_default();
            store
                .query_ordered_by_field(QUESTION_TEXT_FIELD, start_at, pool_size)
                .await?
        }
        FetchStrategy::Sequential => store.query_ordered_by_id(None, pool_size).await?,
    };

    Ok(project_lean(entities))
}

fn project_lean(entities: Vec<QuestionEntity>) -> Vec<QuestionRecord> {
    entities
        .into_iter()
        .filter_map(|entity| match QuestionRecord::try_from(entity) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "skipping incomplete question document");
                None
            }
        })
        .collect()
}

fn spawn_background_refresh(state: SharedState, strategy: FetchStrategy) {
    tokio::spawn(run_background_refresh(state, strategy));
}

/// Fetch a replacement pool and hand it to the cache. The single-flight slot
/// is released on every exit path: success, fetch error, or panic.
async fn run_background_refresh(state: SharedState, strategy: FetchStrategy) {
    let pool_size = state.config().pool_size;
    let fetch_state = state.clone();
    // The fetch runs in its own task so a panic inside it still reaches the
    // `complete_refresh` below as a join error.
    let fetch = tokio::spawn(async move {
        let store = fetch_state.require_question_store().await?;
        let anchor = fetch_state
            .pool_cache()
            .anchor_for(strategy, now_ms())
            .await;
        fetch_pool(store.as_ref(), strategy, anchor, pool_size)
            .await
            .map_err(ServiceError::from)
    });

    let pool = match fetch.await {
        Ok(Ok(questions)) => {
            debug!(strategy = ?strategy, size = questions.len(), "background pool ready");
            Some(Pool::new(questions, strategy))
        }
        Ok(Err(err)) => {
            warn!(
                error = %err,
                strategy = ?strategy,
                "background pool fetch failed; retrying on a later draw"
            );
            None
        }
        Err(err) => {
            warn!(error = %err, strategy = ?strategy, "background pool fetch panicked");
            None
        }
    };

    state.pool_cache().complete_refresh(pool).await;
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
