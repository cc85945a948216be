use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health payload.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let connected = state.lobby().await.client_count();
    HealthResponse::ok(connected)
}
