//! # Metrics
//!
//! Prometheus export for routing and configuration activity. Recording uses
//! the `metrics` macros at the call sites; without an installed recorder they
//! are no-ops.
//!
//! **Counters:**
//! - `ccproxy_routing_decisions_total{rule, passthrough}` - Routing decisions
//! - `ccproxy_config_reloads_total{outcome}` - Applied and rejected reloads
//!
//! **Histograms:**
//! - `ccproxy_routing_duration_seconds` - Time spent classifying a request

pub mod handler;

pub use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use std::net::SocketAddr;

/// Routing decisions take microseconds; buckets reflect that.
const ROUTING_BUCKETS: &[f64] = &[
    0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05,
];

/// Install the global Prometheus recorder.
///
/// Returns a handle used to render the exposition text.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    use metrics_exporter_prometheus::Matcher;

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("ccproxy_routing_duration_seconds".to_string()),
            ROUTING_BUCKETS,
        )?
        .install_recorder()?;

    describe();
    Ok(handle)
}

fn describe() {
    metrics::describe_counter!(
        "ccproxy_routing_decisions_total",
        "Routing decisions by matched rule"
    );
    metrics::describe_counter!(
        "ccproxy_config_reloads_total",
        "Configuration reload attempts by outcome"
    );
    metrics::describe_histogram!(
        "ccproxy_routing_duration_seconds",
        metrics::Unit::Seconds,
        "Time spent classifying a request"
    );
}

/// Serve `GET /metrics` on its own listener until `cancel` fires.
pub async fn serve_metrics(
    addr: SocketAddr,
    handle: PrometheusHandle,
    cancel: tokio_util::sync::CancellationToken,
) -> std::io::Result<()> {
    let app = handler::metrics_router(handle);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Metrics exporter listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}
