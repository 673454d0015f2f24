//! `POST /ccproxy/reload`: reload the configuration source now.

use crate::api::{ApiError, AppState, ReloadResponse};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

pub async fn handle(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let store = Arc::clone(&state.store);
    let source = state.source.clone();
    let outcome = tokio::task::spawn_blocking(move || store.reload(&source))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match outcome {
        Ok(snapshot) => Ok(Json(ReloadResponse {
            version: snapshot.version(),
            rules: snapshot.rules().len(),
            context_threshold: snapshot.context_threshold(),
        })),
        Err(e) => Err(ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())),
    }
}
