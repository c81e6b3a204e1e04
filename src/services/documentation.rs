use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Trivia Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::draw_questions,
        crate::routes::game::get_hints,
        crate::routes::game::preload_hints,
        crate::routes::game::cache_script,
        crate::routes::admin::add_question,
        crate::routes::admin::pool_stats,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::question::DrawQuestionsRequest,
            crate::dto::question::QuestionDto,
            crate::dto::question::HintResponse,
            crate::dto::question::PreloadHintsRequest,
            crate::dto::question::CacheScriptRequest,
            crate::dto::question::PoolStatsResponse,
            crate::dto::admin::AddQuestionRequest,
            crate::dto::admin::AddQuestionResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "game", description = "Question draws and hint delivery"),
        (name = "admin", description = "Corpus maintenance and cache introspection"),
    )
)]
pub struct ApiDoc;
