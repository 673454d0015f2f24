//! Routing endpoints for callers that cannot link the engine directly.

use crate::api::{ApiError, AppState, RouteResponse};
use crate::routing::{RequestDescriptor, RouteRequest, RoutingDecision};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// POST /ccproxy/route - Analyze a messages request and route it.
///
/// Token counting (and building the encoder on first use) runs on the
/// blocking pool.
pub async fn route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, ApiError> {
    let (descriptor, decision) = tokio::task::spawn_blocking(move || {
        let analyzer = state.analyzer();
        state.router().route_request(&request, analyzer)
    })
    .await
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(RouteResponse {
        decision,
        estimated_context_size: descriptor.estimated_context_size,
    }))
}

/// POST /ccproxy/classify - Route an already-computed descriptor.
pub async fn classify(
    State(state): State<Arc<AppState>>,
    Json(descriptor): Json<RequestDescriptor>,
) -> Json<RoutingDecision> {
    Json(state.router().route(&descriptor))
}
