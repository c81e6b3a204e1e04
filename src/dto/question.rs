use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dao::models::QuestionRecord,
    dto::format_system_time,
    state::{hints::HintPayload, pool::PoolStats},
};

/// Payload for drawing a batch of questions.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DrawQuestionsRequest {
    /// Ids of questions this player has already seen (client keeps at most
    /// the 50 most recent). Read-only on the server side.
    #[serde(default)]
    pub history: Vec<String>,
}

/// Lean question projection exposed to game clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionDto {
    /// Stable question identifier.
    pub id: String,
    /// The question prompt.
    pub question_text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// The correct answer.
    pub answer: String,
    /// Key into the storyline/lore content.
    pub storyline_hint_key: String,
}

impl From<QuestionRecord> for QuestionDto {
    fn from(record: QuestionRecord) -> Self {
        Self {
            id: record.id,
            question_text: record.question_text,
            options: record.options,
            answer: record.answer,
            storyline_hint_key: record.storyline_hint_key,
        }
    }
}

/// Hint payload returned for a single question.
#[derive(Debug, Serialize, ToSchema)]
pub struct HintResponse {
    /// Hint prose; a fixed in-character default when nothing better exists.
    pub fallback_hint: String,
    /// Pre-rendered narration script, when one has been generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_script: Option<String>,
}

impl From<HintPayload> for HintResponse {
    fn from(payload: HintPayload) -> Self {
        Self {
            fallback_hint: payload.fallback_hint,
            cached_script: payload.cached_script,
        }
    }
}

/// Payload asking the server to warm the hint cache for upcoming questions.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PreloadHintsRequest {
    /// Question ids about to be played.
    pub ids: Vec<String>,
}

/// Payload carrying a freshly generated narration script.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CacheScriptRequest {
    /// The rendered script text.
    pub script: String,
}

/// Read-only snapshot of the primary pool.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolStatsResponse {
    /// Number of records in the primary pool.
    pub pool_size: usize,
    /// Whole minutes since the primary pool was fetched.
    pub pool_age_minutes: u64,
    /// Ids of the primary pool members.
    pub pool_question_ids: Vec<String>,
    /// RFC 3339 timestamp of the primary pool fetch, when one is installed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_created_at: Option<String>,
}

impl From<PoolStats> for PoolStatsResponse {
    fn from(stats: PoolStats) -> Self {
        Self {
            pool_size: stats.pool_size,
            pool_age_minutes: stats.pool_age_minutes,
            pool_question_ids: stats.pool_question_ids,
            pool_created_at: stats.pool_created_at.map(format_system_time),
        }
    }
}
