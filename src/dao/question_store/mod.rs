#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::QuestionEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Stored field name holding the question prompt; used by the text-anchored
/// range query and the matching backend index.
pub const QUESTION_TEXT_FIELD: &str = "question_text";

/// Abstraction over the persistence layer for the question corpus.
///
/// The pool fetcher only ever issues small range-style scans through this
/// trait; a full-collection read never happens on the request path.
pub trait QuestionStore: Send + Sync {
    /// Questions ordered by id, starting at-or-after `start_at` when given,
    /// capped at `limit` rows.
    fn query_ordered_by_id(
        &self,
        start_at: Option<String>,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;

    /// Questions ordered by an arbitrary stored field, starting at-or-after
    /// `start_at`, capped at `limit` rows.
    fn query_ordered_by_field(
        &self,
        field: &'static str,
        start_at: String,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;

    /// Load a single question document by id.
    fn get_by_id(&self, id: String) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;

    /// Write a full question document, replacing any previous version.
    fn insert_question(&self, question: QuestionEntity)
    -> BoxFuture<'static, StorageResult<()>>;

    /// Merge a generated narration script into an existing document without
    /// clobbering its other fields.
    fn merge_script(&self, id: String, script: String) -> BoxFuture<'static, StorageResult<()>>;

    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;

    /// Attempt to re-establish the backend connection after a failed probe.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
