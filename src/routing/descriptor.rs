//! Provider-agnostic summary of one inbound call.

use serde::{Deserialize, Serialize};

/// What the routing engine knows about a request.
///
/// Built by the caller (or by [`RequestAnalyzer`](super::RequestAnalyzer))
/// and consumed once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDescriptor {
    /// Estimated prompt size in tokens; negative values are treated as 0
    pub estimated_context_size: i64,
    pub requested_model: String,
    pub thinking_requested: bool,
    pub web_search_requested: bool,
    pub is_background: bool,
}

impl RequestDescriptor {
    pub fn new(requested_model: impl Into<String>) -> Self {
        Self {
            requested_model: requested_model.into(),
            ..Default::default()
        }
    }

    pub fn with_context_size(mut self, tokens: i64) -> Self {
        self.estimated_context_size = tokens;
        self
    }

    pub fn with_thinking(mut self, requested: bool) -> Self {
        self.thinking_requested = requested;
        self
    }

    pub fn with_web_search(mut self, requested: bool) -> Self {
        self.web_search_requested = requested;
        self
    }

    pub fn with_background(mut self, background: bool) -> Self {
        self.is_background = background;
        self
    }

    /// Context size normalized to the valid range.
    pub fn context_size(&self) -> u64 {
        self.estimated_context_size.max(0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let d = RequestDescriptor::new("model-A")
            .with_context_size(60_000)
            .with_thinking(true);
        assert_eq!(d.requested_model, "model-A");
        assert_eq!(d.context_size(), 60_000);
        assert!(d.thinking_requested);
        assert!(!d.web_search_requested);
    }

    #[test]
    fn test_negative_context_normalized() {
        let d = RequestDescriptor::new("m").with_context_size(-5);
        assert_eq!(d.context_size(), 0);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let d: RequestDescriptor =
            serde_json::from_str(r#"{"requested_model": "model-A", "is_background": true}"#)
                .unwrap();
        assert!(d.is_background);
        assert_eq!(d.estimated_context_size, 0);
    }
}
