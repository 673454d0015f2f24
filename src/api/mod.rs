//! # Control surface
//!
//! HTTP endpoints the host transport mounts to reach the routing core.
//!
//! ## Endpoints
//!
//! - `GET /ccproxy/status` - Last routing decision (404 before the first request)
//! - `POST /ccproxy/route` - Analyze a messages request and route it
//! - `POST /ccproxy/classify` - Route an already-computed request descriptor
//! - `POST /ccproxy/reload` - Reload the configuration source
//! - `GET /health` - Liveness and active config version
//!
//! ## Example
//!
//! ```no_run
//! use ccproxy::api::{create_router, AppState};
//! use ccproxy::config::{ConfigSource, ConfigStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = ConfigSource::resolve(None);
//! let store = Arc::new(ConfigStore::initialize(&source)?);
//! let state = Arc::new(AppState::new(store, source));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:4000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod health;
mod reload;
mod route;
mod status;
pub mod types;

pub use health::HealthResponse;
pub use types::*;

use crate::config::{ConfigSource, ConfigStore};
use crate::routing::{ModelAvailability, RequestAnalyzer, Router};
use crate::status::StatusPublisher;
use axum::{
    routing::{get, post},
    Router as HttpRouter,
};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (32 MB); routed bodies carry whole conversations.
const MAX_BODY_SIZE: usize = 32 * 1024 * 1024;

/// Process-wide services shared by all handlers.
///
/// Built once at startup and torn down when the last `Arc` drops. The router
/// and the token analyzer are created on first use.
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub status: Arc<StatusPublisher>,
    /// Source re-read by `POST /ccproxy/reload`
    pub source: ConfigSource,
    pub start_time: Instant,
    availability: Option<Arc<dyn ModelAvailability>>,
    router: OnceLock<Router>,
    analyzer: OnceLock<RequestAnalyzer>,
}

impl AppState {
    pub fn new(store: Arc<ConfigStore>, source: ConfigSource) -> Self {
        Self {
            store,
            status: Arc::new(StatusPublisher::new()),
            source,
            start_time: Instant::now(),
            availability: None,
            router: OnceLock::new(),
            analyzer: OnceLock::new(),
        }
    }

    /// Route against an external availability lookup.
    pub fn with_availability(mut self, availability: Arc<dyn ModelAvailability>) -> Self {
        self.availability = Some(availability);
        self
    }

    /// Share an existing publisher instead of the one created by `new`.
    pub fn with_status(mut self, status: Arc<StatusPublisher>) -> Self {
        self.status = status;
        self
    }

    /// The routing engine, built on first call.
    pub fn router(&self) -> &Router {
        self.router.get_or_init(|| {
            let router = Router::new(Arc::clone(&self.store), Arc::clone(&self.status));
            match &self.availability {
                Some(availability) => router.with_availability(Arc::clone(availability)),
                None => router,
            }
        })
    }

    /// The token analyzer, built on first call (loading the BPE is slow).
    pub fn analyzer(&self) -> &RequestAnalyzer {
        self.analyzer.get_or_init(RequestAnalyzer::new)
    }

    /// Clear the last decision and restore the initial config snapshot.
    pub fn reset(&self) {
        self.status.reset();
        self.store.reset();
    }
}

/// Create the control router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> HttpRouter {
    HttpRouter::new()
        .route("/ccproxy/status", get(status::handle))
        .route("/ccproxy/route", post(route::route))
        .route("/ccproxy/classify", post(route::classify))
        .route("/ccproxy/reload", post(reload::handle))
        .route("/health", get(health::handle))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
