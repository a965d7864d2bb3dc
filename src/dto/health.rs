use serde::Serialize;
use utoipa::ToSchema;

use crate::state::SaveStatus;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Where the match document is stored.
    pub storage: String,
    /// Outcome of the latest save.
    pub save_status: SaveStatus,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(storage: String, save_status: SaveStatus) -> Self {
        Self {
            status: "ok".to_string(),
            storage,
            save_status,
        }
    }

    /// Create a health response indicating storage cannot be reached.
    pub fn degraded(storage: String, save_status: SaveStatus) -> Self {
        Self {
            status: "degraded".to_string(),
            storage,
            save_status,
        }
    }
}
