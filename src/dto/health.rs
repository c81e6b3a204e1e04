use serde::Serialize;
use utoipa::ToSchema;

/// Health payload served by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `"ok"` while the question store answers, `"degraded"` otherwise.
    pub status: String,
}

impl HealthResponse {
    /// The question store is installed and reachable.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// No question store is installed; only cached pools can serve.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
