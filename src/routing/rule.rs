//! Routing labels, predicates, and compiled rules.

use globset::GlobMatcher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RequestDescriptor;

/// Classification outcome of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingLabel {
    Default,
    Background,
    Think,
    LargeContext,
    WebSearch,
}

impl RoutingLabel {
    pub const ALL: [RoutingLabel; 5] = [
        RoutingLabel::Default,
        RoutingLabel::Background,
        RoutingLabel::Think,
        RoutingLabel::LargeContext,
        RoutingLabel::WebSearch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingLabel::Default => "default",
            RoutingLabel::Background => "background",
            RoutingLabel::Think => "think",
            RoutingLabel::LargeContext => "large_context",
            RoutingLabel::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for RoutingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoutingLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("Invalid routing label: {}", s))
    }
}

/// Compiled predicate over a [`RequestDescriptor`].
#[derive(Debug, Clone)]
pub enum Matcher {
    Always,
    Background,
    Thinking,
    WebSearch,
    /// Inclusive: `context >= tokens`
    ContextAtLeast(u64),
    Model { pattern: String, glob: GlobMatcher },
}

impl Matcher {
    pub fn matches(&self, descriptor: &RequestDescriptor) -> bool {
        match self {
            Matcher::Always => true,
            Matcher::Background => descriptor.is_background,
            Matcher::Thinking => descriptor.thinking_requested,
            Matcher::WebSearch => descriptor.web_search_requested,
            Matcher::ContextAtLeast(tokens) => descriptor.context_size() >= *tokens,
            Matcher::Model { glob, .. } => glob.is_match(&descriptor.requested_model),
        }
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Always, Matcher::Always)
            | (Matcher::Background, Matcher::Background)
            | (Matcher::Thinking, Matcher::Thinking)
            | (Matcher::WebSearch, Matcher::WebSearch) => true,
            (Matcher::ContextAtLeast(a), Matcher::ContextAtLeast(b)) => a == b,
            (Matcher::Model { pattern: a, .. }, Matcher::Model { pattern: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// One entry of a snapshot's ordered rule list.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingRule {
    label: RoutingLabel,
    matcher: Matcher,
    target_model: String,
}

impl RoutingRule {
    pub fn new(label: RoutingLabel, matcher: Matcher, target_model: impl Into<String>) -> Self {
        Self {
            label,
            matcher,
            target_model: target_model.into(),
        }
    }

    pub fn label(&self) -> RoutingLabel {
        self.label
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn target_model(&self) -> &str {
        &self.target_model
    }

    pub fn matches(&self, descriptor: &RequestDescriptor) -> bool {
        self.matcher.matches(descriptor)
    }
}
