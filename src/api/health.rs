//! Health check endpoint handler.

use crate::api::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub config_version: u64,
    pub rules: usize,
    pub uptime_seconds: u64,
}

/// GET /health - Liveness plus the active config version.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let snapshot = state.store.current();
    Json(HealthResponse {
        status: "ok".to_string(),
        config_version: snapshot.version(),
        rules: snapshot.rules().len(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
