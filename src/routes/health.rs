use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub(super) struct HealthResponse {
    status: &'static str,
    timestamp: String,
    uptime: u64,
    connections: usize,
}

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime: state.uptime_seconds(),
        connections: state.hub().total_connections(),
    })
}
