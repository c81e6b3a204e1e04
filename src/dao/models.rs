use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of answer options every stored question carries.
pub const OPTION_COUNT: usize = 4;

/// Full question document persisted by the storage layer.
///
/// The two trailing fields are heavy, optional enrichments (hand-written hint
/// prose and a pre-rendered narration script). They are only loaded on the
/// per-question hint path and never enter a pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier of the question.
    pub id: String,
    /// The question prompt shown to players.
    pub question_text: String,
    /// Ordered answer options; exactly [`OPTION_COUNT`] entries on a complete document.
    pub options: Vec<String>,
    /// The correct answer; must equal one of `options`.
    pub answer: String,
    /// Foreign key into the storyline/lore content.
    pub storyline_hint_key: String,
    /// Hand-written hint prose shown when no script is available.
    pub fallback_hint: Option<String>,
    /// Pre-rendered narration script, if one was generated.
    pub cached_script: Option<String>,
}

/// Lean, client-safe projection of a question used inside pools.
///
/// Heavy fields are dropped before a record leaves the fetcher so the pool
/// never caches large text blobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionRecord {
    /// Stable identifier of the question.
    pub id: String,
    /// The question prompt shown to players.
    pub question_text: String,
    /// Ordered answer options.
    pub options: Vec<String>,
    /// The correct answer.
    pub answer: String,
    /// Foreign key into the storyline/lore content.
    pub storyline_hint_key: String,
}

/// Reason a stored document was rejected from the pool path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IncompleteQuestion {
    /// The document has an empty identifier.
    #[error("question has an empty id")]
    EmptyId,
    /// The document has no prompt text.
    #[error("question `{id}` has empty question text")]
    EmptyText {
        /// Identifier of the offending document.
        id: String,
    },
    /// The document does not carry exactly [`OPTION_COUNT`] non-empty options.
    #[error("question `{id}` has {count} usable options (expected {OPTION_COUNT})")]
    BadOptions {
        /// Identifier of the offending document.
        id: String,
        /// Number of usable options found.
        count: usize,
    },
    /// The recorded answer does not match any option.
    #[error("question `{id}` has an answer that matches no option")]
    AnswerNotAnOption {
        /// Identifier of the offending document.
        id: String,
    },
}

impl TryFrom<QuestionEntity> for QuestionRecord {
    type Error = IncompleteQuestion;

    /// Project a stored document to its lean shape, rejecting syntactically
    /// incomplete questions so they never reach a pool.
    fn try_from(entity: QuestionEntity) -> Result<Self, Self::Error> {
        if entity.id.trim().is_empty() {
            return Err(IncompleteQuestion::EmptyId);
        }
        if entity.question_text.trim().is_empty() {
            return Err(IncompleteQuestion::EmptyText { id: entity.id });
        }

        let usable = entity
            .options
            .iter()
            .filter(|option| !option.trim().is_empty())
            .count();
        if entity.options.len() != OPTION_COUNT || usable != OPTION_COUNT {
            return Err(IncompleteQuestion::BadOptions {
                id: entity.id,
                count: usable,
            });
        }

        if !entity.options.contains(&entity.answer) {
            return Err(IncompleteQuestion::AnswerNotAnOption { id: entity.id });
        }

        Ok(Self {
            id: entity.id,
            question_text: entity.question_text,
            options: entity.options,
            answer: entity.answer,
            storyline_hint_key: entity.storyline_hint_key,
        })
    }
}
