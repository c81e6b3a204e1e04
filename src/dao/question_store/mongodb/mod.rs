//! MongoDB implementation of the question store.

mod connection;
mod error;
mod models;

/// Connection settings for the MongoDB backend.
pub mod config;
/// The [`QuestionStore`](crate::dao::question_store::QuestionStore) implementation.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoQuestionStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
