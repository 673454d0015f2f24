//! Shared helpers for integration tests.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use ccproxy::api::{create_router, AppState};
use ccproxy::config::{ConfigSource, ConfigStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceExt;

/// Router and state over an inline configuration.
pub fn app_with_config(toml: &str) -> (axum::Router, Arc<AppState>) {
    let source = ConfigSource::Inline(toml.to_string());
    let store = Arc::new(ConfigStore::initialize(&source).unwrap());
    let state = Arc::new(AppState::new(store, source));
    (create_router(Arc::clone(&state)), state)
}

/// Router and state over a config file on disk.
pub fn app_with_file(path: &Path) -> (axum::Router, Arc<AppState>) {
    let source = ConfigSource::File(path.to_path_buf());
    let store = Arc::new(ConfigStore::initialize(&source).unwrap());
    let state = Arc::new(AppState::new(store, source));
    (create_router(Arc::clone(&state)), state)
}

pub fn write_config(dir: &Path, toml: &str) -> PathBuf {
    let path = dir.join("ccproxy.toml");
    std::fs::write(&path, toml).unwrap();
    path
}

pub async fn get(app: &axum::Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: &axum::Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
