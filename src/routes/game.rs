use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};

use crate::{
    dto::question::{
        CacheScriptRequest, DrawQuestionsRequest, HintResponse, PreloadHintsRequest, QuestionDto,
    },
    error::AppError,
    services::{hint_service, pool_service},
    state::SharedState,
};

/// Routes serving game clients: question draws and hint delivery.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/questions/draw", post(draw_questions))
        .route("/questions/{id}/hints", get(get_hints))
        .route("/questions/hints/preload", post(preload_hints))
        .route("/questions/{id}/script", put(cache_script))
}

/// Draw a batch of unseen questions for a new game.
#[utoipa::path(
    post,
    path = "/questions/draw",
    tag = "game",
    request_body = DrawQuestionsRequest,
    responses(
        (status = 200, description = "Questions drawn", body = [QuestionDto]),
        (status = 503, description = "Storage unavailable and no pool is cached")
    )
)]
pub async fn draw_questions(
    State(state): State<SharedState>,
    Json(payload): Json<DrawQuestionsRequest>,
) -> Result<Json<Vec<QuestionDto>>, AppError> {
    let questions = pool_service::draw_questions(&state, payload.history).await?;
    Ok(Json(questions))
}

/// Fetch the hint payload for one question. Never fails: a default hint is
/// served when the corpus has none or storage is down.
#[utoipa::path(
    get,
    path = "/questions/{id}/hints",
    tag = "game",
    params(("id" = String, Path, description = "Question identifier")),
    responses((status = 200, description = "Hint payload", body = HintResponse))
)]
pub async fn get_hints(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<HintResponse> {
    Json(hint_service::get_hints(&state, &id).await.into())
}

/// Warm the hint cache for a list of upcoming questions.
#[utoipa::path(
    post,
    path = "/questions/hints/preload",
    tag = "game",
    request_body = PreloadHintsRequest,
    responses((status = 204, description = "Cache warmed"))
)]
pub async fn preload_hints(
    State(state): State<SharedState>,
    Json(payload): Json<PreloadHintsRequest>,
) -> StatusCode {
    hint_service::preload_hints(&state, payload.ids).await;
    StatusCode::NO_CONTENT
}

/// Store a freshly generated narration script for a question.
#[utoipa::path(
    put,
    path = "/questions/{id}/script",
    tag = "game",
    params(("id" = String, Path, description = "Question identifier")),
    request_body = CacheScriptRequest,
    responses((status = 204, description = "Script accepted"))
)]
pub async fn cache_script(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(payload): Json<CacheScriptRequest>,
) -> StatusCode {
    hint_service::cache_script(&state, &id, &payload.script).await;
    StatusCode::NO_CONTENT
}
