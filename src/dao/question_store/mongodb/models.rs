use serde::{Deserialize, Serialize};

use crate::dao::models::QuestionEntity;

/// On-disk shape of a question document in the `questions` collection.
///
/// `_id` is the application-level question id (a time-ordered string), so the
/// default `_id` index already serves the id-anchored range scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: String,
    question_text: String,
    options: Vec<String>,
    answer: String,
    storyline_hint_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cached_script: Option<String>,
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            question_text: value.question_text,
            options: value.options,
            answer: value.answer,
            storyline_hint_key: value.storyline_hint_key,
            fallback_hint: value.fallback_hint,
            cached_script: value.cached_script,
        }
    }
}

impl From<MongoQuestionDocument> for QuestionEntity {
    fn from(value: MongoQuestionDocument) -> Self {
        Self {
            id: value.id,
            question_text: value.question_text,
            options: value.options,
            answer: value.answer,
            storyline_hint_key: value.storyline_hint_key,
            fallback_hint: value.fallback_hint,
            cached_script: value.cached_script,
        }
    }
}
