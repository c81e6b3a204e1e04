/// Database model definitions.
pub mod models;
/// Question corpus storage and query operations.
pub mod question_store;
/// Storage abstraction layer for database operations.
pub mod storage;
