//! `GET /ccproxy/status`: the last routing decision.

use crate::api::{ApiError, AppState};
use crate::routing::RoutingDecision;
use axum::{extract::State, Json};
use std::sync::Arc;

/// 200 with the last decision, 404 before the first request.
pub async fn handle(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoutingDecision>, ApiError> {
    state
        .status
        .last()
        .map(|decision| Json(decision.as_ref().clone()))
        .ok_or_else(ApiError::no_requests_yet)
}
