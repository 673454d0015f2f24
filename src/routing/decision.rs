//! The outcome of routing one request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RoutingLabel;

/// Produced once per request by the routing engine.
///
/// Serializes in the shape served by `GET /ccproxy/status`, where
/// `routed_model` is exposed as `model`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Label of the matched rule; `None` for passthrough
    pub rule: Option<String>,
    #[serde(rename = "model")]
    pub routed_model: String,
    pub original_model: String,
    pub is_passthrough: bool,
    pub timestamp: DateTime<Utc>,
}

impl RoutingDecision {
    pub fn routed(
        label: RoutingLabel,
        original_model: impl Into<String>,
        routed_model: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            rule: Some(label.as_str().to_string()),
            routed_model: routed_model.into(),
            original_model: original_model.into(),
            is_passthrough: false,
            timestamp,
        }
    }

    pub fn passthrough(original_model: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        let original_model = original_model.into();
        Self {
            rule: None,
            routed_model: original_model.clone(),
            original_model,
            is_passthrough: true,
            timestamp,
        }
    }

    /// Label of the matched rule, parsed back.
    pub fn label(&self) -> Option<RoutingLabel> {
        self.rule.as_deref().and_then(|r| r.parse().ok())
    }
}
