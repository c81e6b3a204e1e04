use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB-backed operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB question store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The client could not be constructed from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The initial connectivity ping never succeeded.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Number of attempts made before giving up.
        attempts: u32,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A routine health probe failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// Index bootstrap failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index field description.
        index: &'static str,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A pool range scan failed.
    #[error("failed to query questions ordered by `{order_by}`")]
    QueryQuestions {
        /// Field the scan was ordered by.
        order_by: &'static str,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A single-document lookup failed.
    #[error("failed to load question `{id}`")]
    LoadQuestion {
        /// Identifier of the requested question.
        id: String,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// A full-document write failed.
    #[error("failed to save question `{id}`")]
    SaveQuestion {
        /// Identifier of the question being written.
        id: String,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
    /// The script merge-write failed.
    #[error("failed to cache script for question `{id}`")]
    CacheScript {
        /// Identifier of the question being enriched.
        id: String,
        /// Driver-level cause.
        #[source]
        source: MongoError,
    },
}
