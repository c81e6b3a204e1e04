//! Business logic powering the admin REST routes: corpus writes and the
//! read-only pool snapshot.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::QuestionEntity,
    dto::{
        admin::{AddQuestionRequest, AddQuestionResponse},
        question::PoolStatsResponse,
    },
    error::ServiceError,
    state::SharedState,
};

/// Persist a new question and drop every cache that could now be stale.
///
/// Both the pool cache and the hint cache are invalidated so the next draw
/// refetches a pool that can contain the new question.
pub async fn add_question(
    state: &SharedState,
    payload: AddQuestionRequest,
) -> Result<AddQuestionResponse, ServiceError> {
    let store = state.require_question_store().await?;

    let id = generate_question_id();
    let entity = QuestionEntity {
        id: id.clone(),
        question_text: payload.question_text,
        options: payload.options,
        answer: payload.answer,
        storyline_hint_key: payload.storyline_hint_key,
        fallback_hint: payload.fallback_hint,
        cached_script: payload.cached_script,
    };

    store.insert_question(entity).await?;
    state.pool_cache().invalidate().await;
    state.hint_cache().clear();
    info!(question_id = %id, "question added; caches invalidated");

    Ok(AddQuestionResponse { id })
}

/// Snapshot of the primary pool for operators.
pub async fn pool_stats(state: &SharedState) -> PoolStatsResponse {
    state.pool_cache().stats().await.into()
}

/// Time-ordered unique id: the unix-millis prefix keeps ids sortable by
/// insertion time, the uuid suffix breaks same-millisecond collisions.
fn generate_question_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
    format!("q{millis:013}-{suffix}")
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        config::AppConfig,
        dao::question_store::testing::StubStore,
        services::pool_service,
        state::AppState,
    };

    fn request() -> AddQuestionRequest {
        AddQuestionRequest {
            question_text: "Zounds, which knot holds a ship to its anchor?".into(),
            options: vec![
                "Anchor bend".into(),
                "Bowline".into(),
                "Clove hitch".into(),
                "Sheet bend".into(),
            ],
            answer: "Anchor bend".into(),
            storyline_hint_key: "anchor-bend".into(),
            fallback_hint: None,
            cached_script: None,
        }
    }

    async fn state_with(store: &StubStore) -> SharedState {
        let state = AppState::with_rng(AppConfig::default(), StdRng::seed_from_u64(0));
        state.install_question_store(Arc::new(store.clone())).await;
        state
    }

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let first = generate_question_id();
        let second = generate_question_id();

        assert!(first.starts_with('q'));
        assert_eq!(first.len(), "q".len() + 13 + "-".len() + 6);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn add_question_persists_and_returns_the_new_id() {
        let store = StubStore::with_questions(Vec::new());
        let state = state_with(&store).await;

        let response = add_question(&state, request()).await.expect("add");

        assert_eq!(store.write_calls(), 1);
        let persisted = store.find(&response.id).await.expect("persisted");
        assert_eq!(
            persisted.question_text,
            "Zounds, which knot holds a ship to its anchor?"
        );
    }

    #[tokio::test]
    async fn add_question_invalidates_the_pool_cache() {
        let store = StubStore::with_questions(Vec::new());
        let state = state_with(&store).await;

        add_question(&state, request()).await.expect("first add");
        let queries_before = store.query_calls();

        // The pool was dropped, so the next draw must hit storage again and
        // can therefore see the question added after it.
        let stats = pool_stats(&state).await;
        assert_eq!(stats.pool_size, 0);

        let drawn = pool_service::draw_questions(&state, Vec::new())
            .await
            .expect("draw");
        assert_eq!(drawn.len(), 1);
        assert!(store.query_calls() > queries_before);
    }

    #[tokio::test]
    async fn add_question_without_storage_is_rejected() {
        let state = AppState::with_rng(AppConfig::default(), StdRng::seed_from_u64(0));
        let err = add_question(&state, request()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn pool_stats_reports_the_installed_primary() {
        let store = StubStore::with_questions(Vec::new());
        let state = state_with(&store).await;
        add_question(&state, request()).await.expect("add");

        pool_service::draw_questions(&state, Vec::new())
            .await
            .expect("draw");

        let stats = pool_stats(&state).await;
        assert_eq!(stats.pool_size, 1);
        assert_eq!(stats.pool_question_ids.len(), 1);
        assert!(stats.pool_created_at.is_some());
    }
}
