use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::{validate_answer, validate_options};

/// Payload used to add a new question to the corpus.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddQuestionRequest {
    /// The question prompt.
    pub question_text: String,
    /// Ordered answer options; exactly four non-empty entries.
    pub options: Vec<String>,
    /// The correct answer; must equal one of the options.
    pub answer: String,
    /// Key into the storyline/lore content.
    pub storyline_hint_key: String,
    /// Optional hand-written hint prose.
    #[serde(default)]
    pub fallback_hint: Option<String>,
    /// Optional pre-rendered narration script.
    #[serde(default)]
    pub cached_script: Option<String>,
}

impl Validate for AddQuestionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.question_text.trim().is_empty() {
            let mut err = validator::ValidationError::new("question_text_empty");
            err.message = Some("question text must not be empty".into());
            errors.add("question_text", err);
        }

        if let Err(err) = validate_options(&self.options) {
            errors.add("options", err);
        }

        if let Err(err) = validate_answer(&self.answer, &self.options) {
            errors.add("answer", err);
        }

        if self.storyline_hint_key.trim().is_empty() {
            let mut err = validator::ValidationError::new("storyline_hint_key_empty");
            err.message = Some("storyline hint key must not be empty".into());
            errors.add("storyline_hint_key", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Identifier of a freshly created question.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddQuestionResponse {
    /// Time-based unique id assigned by the server.
    pub id: String,
}
