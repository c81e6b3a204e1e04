use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::{
        admin::{AddQuestionRequest, AddQuestionResponse},
        question::PoolStatsResponse,
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

/// Admin-only endpoints for corpus maintenance and cache introspection.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/questions", post(add_question))
        .route("/admin/pool/stats", get(pool_stats))
}

/// Add a question to the corpus and invalidate the caches.
#[utoipa::path(
    post,
    path = "/admin/questions",
    tag = "admin",
    request_body = AddQuestionRequest,
    responses(
        (status = 200, description = "Question created", body = AddQuestionResponse),
        (status = 400, description = "Payload failed validation"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn add_question(
    State(state): State<SharedState>,
    Json(payload): Json<AddQuestionRequest>,
) -> Result<Json<AddQuestionResponse>, AppError> {
    payload.validate()?;
    let response = admin_service::add_question(&state, payload).await?;
    Ok(Json(response))
}

/// Inspect the primary question pool.
#[utoipa::path(
    get,
    path = "/admin/pool/stats",
    tag = "admin",
    responses((status = 200, description = "Pool snapshot", body = PoolStatsResponse))
)]
pub async fn pool_stats(State(state): State<SharedState>) -> Json<PoolStatsResponse> {
    Json(admin_service::pool_stats(&state).await)
}
