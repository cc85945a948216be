use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the process is serving.
    pub status: String,
    /// Number of currently connected clients.
    pub connected_clients: usize,
}

impl HealthResponse {
    /// Create a health response for the given connection count.
    pub fn ok(connected_clients: usize) -> Self {
        Self {
            status: "ok".to_string(),
            connected_clients,
        }
    }
}
