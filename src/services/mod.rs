/// Admin service for corpus writes and pool introspection.
pub mod admin_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Hint lookup, preloading, and script caching.
pub mod hint_service;
/// Question-pool fetching, rotation, and draws.
pub mod pool_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
