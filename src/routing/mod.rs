//! Context-aware routing engine
//!
//! Maps a [`RequestDescriptor`] to a [`RoutingDecision`] under the current
//! [`ConfigSnapshot`]. Rules are evaluated in declaration order and the first
//! match whose target is available wins; otherwise the request passes through
//! to the model it asked for.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

pub mod analyzer;
pub mod availability;
pub mod decision;
pub mod descriptor;
pub mod error;
pub mod rule;

pub use analyzer::{ContentBlock, Message, MessageContent, RequestAnalyzer, RouteRequest};
pub use availability::{AllModelsAvailable, ModelAvailability, ModelCatalog};
pub use decision::RoutingDecision;
pub use descriptor::RequestDescriptor;
pub use error::RoutingError;
pub use rule::{Matcher, RoutingLabel, RoutingRule};

use crate::config::{ConfigSnapshot, ConfigStore};
use crate::status::StatusPublisher;

/// Classify one request.
///
/// Pure: the result depends only on the arguments. A rule whose target the
/// availability lookup rejects is skipped in favour of later rules.
pub fn classify(
    descriptor: &RequestDescriptor,
    snapshot: &ConfigSnapshot,
    availability: &dyn ModelAvailability,
    timestamp: DateTime<Utc>,
) -> RoutingDecision {
    for rule in snapshot.rules() {
        if !rule.matches(descriptor) {
            continue;
        }
        match availability.check(rule.target_model()) {
            Ok(()) => {
                return RoutingDecision::routed(
                    rule.label(),
                    descriptor.requested_model.as_str(),
                    rule.target_model(),
                    timestamp,
                );
            }
            Err(e) => {
                tracing::debug!(
                    rule = %rule.label(),
                    error = %e,
                    "Rule target unavailable, trying next rule"
                );
            }
        }
    }

    RoutingDecision::passthrough(descriptor.requested_model.as_str(), timestamp)
}

/// Routes requests against the live configuration and publishes each
/// decision.
pub struct Router {
    store: Arc<ConfigStore>,
    status: Arc<StatusPublisher>,
    /// Overrides the snapshot's own catalog when set
    availability: Option<Arc<dyn ModelAvailability>>,
}

impl Router {
    pub fn new(store: Arc<ConfigStore>, status: Arc<StatusPublisher>) -> Self {
        Self {
            store,
            status,
            availability: None,
        }
    }

    /// Use an external availability lookup instead of `[models] unavailable`.
    pub fn with_availability(mut self, availability: Arc<dyn ModelAvailability>) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn status(&self) -> &Arc<StatusPublisher> {
        &self.status
    }

    /// Classify against the current snapshot and publish the decision.
    ///
    /// Never fails; the worst case is a passthrough decision.
    pub fn route(&self, descriptor: &RequestDescriptor) -> RoutingDecision {
        // One load per request: the whole decision uses a single snapshot.
        let snapshot = self.store.current();
        self.route_on(&snapshot, descriptor)
    }

    /// Derive the descriptor with `analyzer` and route it, reading the
    /// snapshot once for both steps.
    pub fn route_request(
        &self,
        request: &RouteRequest,
        analyzer: &RequestAnalyzer,
    ) -> (RequestDescriptor, RoutingDecision) {
        let snapshot = self.store.current();
        let descriptor = analyzer.analyze(request, &snapshot);
        let decision = self.route_on(&snapshot, &descriptor);
        (descriptor, decision)
    }

    fn route_on(&self, snapshot: &ConfigSnapshot, descriptor: &RequestDescriptor) -> RoutingDecision {
        let start = Instant::now();
        let decision = match &self.availability {
            Some(availability) => classify(descriptor, snapshot, availability.as_ref(), Utc::now()),
            None => classify(descriptor, snapshot, snapshot.model_catalog(), Utc::now()),
        };

        let rule = decision.rule.clone().unwrap_or_else(|| "passthrough".to_string());
        metrics::counter!(
            "ccproxy_routing_decisions_total",
            "rule" => rule,
            "passthrough" => decision.is_passthrough.to_string()
        )
        .increment(1);
        metrics::histogram!("ccproxy_routing_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        tracing::info!(
            rule = decision.rule.as_deref().unwrap_or("-"),
            original_model = %decision.original_model,
            routed_model = %decision.routed_model,
            passthrough = decision.is_passthrough,
            context_size = descriptor.context_size(),
            config_version = snapshot.version(),
            "Routed request"
        );

        self.status.publish(decision.clone());
        decision
    }
}
