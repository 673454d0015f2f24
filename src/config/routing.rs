//! Routing rule configuration

use globset::Glob;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::error::ConfigError;
use crate::routing::{Matcher, RoutingLabel, RoutingRule};

/// A routing rule as written in the configuration file.
///
/// ```toml
/// [[rules]]
/// label = "background"
/// target_model = "claude-3-5-haiku-latest"
/// match = { kind = "model", pattern = "*haiku*" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub label: RoutingLabel,
    pub target_model: String,
    /// Defaults to the natural predicate for `label` when omitted
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<MatcherConfig>,
}

/// Predicate specification for a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatcherConfig {
    Always,
    Background,
    Thinking,
    WebSearch,
    /// `estimated_context_size >= tokens`; falls back to `context_threshold`
    ContextAtLeast {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tokens: Option<u64>,
    },
    /// Glob over the requested model id
    Model { pattern: String },
}

impl MatcherConfig {
    /// The predicate a rule gets when its `match` is omitted.
    pub fn for_label(label: RoutingLabel) -> Self {
        match label {
            RoutingLabel::Default => MatcherConfig::Always,
            RoutingLabel::Background => MatcherConfig::Background,
            RoutingLabel::Think => MatcherConfig::Thinking,
            RoutingLabel::LargeContext => MatcherConfig::ContextAtLeast { tokens: None },
            RoutingLabel::WebSearch => MatcherConfig::WebSearch,
        }
    }
}

impl RuleConfig {
    /// Compile into an evaluable rule, resolving the context threshold.
    pub fn compile(&self, index: usize, context_threshold: u64) -> Result<RoutingRule, ConfigError> {
        let target = self.target_model.trim();
        if target.is_empty() {
            return Err(ConfigError::validation(
                format!("rules[{}].target_model", index),
                "target model cannot be empty",
            ));
        }

        let spec = self
            .matcher
            .clone()
            .unwrap_or_else(|| MatcherConfig::for_label(self.label));

        let matcher = match spec {
            MatcherConfig::Always => Matcher::Always,
            MatcherConfig::Background => Matcher::Background,
            MatcherConfig::Thinking => Matcher::Thinking,
            MatcherConfig::WebSearch => Matcher::WebSearch,
            MatcherConfig::ContextAtLeast { tokens } => {
                let tokens = tokens.unwrap_or(context_threshold);
                if tokens == 0 {
                    return Err(ConfigError::validation(
                        format!("rules[{}].match.tokens", index),
                        "context threshold must be greater than zero",
                    ));
                }
                Matcher::ContextAtLeast(tokens)
            }
            MatcherConfig::Model { pattern } => {
                let glob = Glob::new(&pattern).map_err(|e| {
                    ConfigError::validation(format!("rules[{}].match.pattern", index), e.to_string())
                })?;
                Matcher::Model {
                    pattern,
                    glob: glob.compile_matcher(),
                }
            }
        };

        Ok(RoutingRule::new(self.label, matcher, target))
    }
}

/// Models that rules must not route to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Targets taken out of rotation; matching rules fall through
    pub unavailable: Vec<String>,
}

impl ModelsConfig {
    pub fn unavailable_set(&self) -> HashSet<String> {
        self.unavailable.iter().map(|m| m.trim().to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::RequestDescriptor;

    fn descriptor(context: i64, model: &str) -> RequestDescriptor {
        RequestDescriptor {
            estimated_context_size: context,
            requested_model: model.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_rule_parses_without_match() {
        let rule: RuleConfig = toml::from_str(
            r#"
            label = "large_context"
            target_model = "model-B"
            "#,
        )
        .unwrap();
        assert_eq!(rule.label, RoutingLabel::LargeContext);
        assert!(rule.matcher.is_none());
    }

    #[test]
    fn test_rule_parses_model_matcher() {
        let rule: RuleConfig = toml::from_str(
            r#"
            label = "background"
            target_model = "small"
            match = { kind = "model", pattern = "*haiku*" }
            "#,
        )
        .unwrap();
        assert_eq!(
            rule.matcher,
            Some(MatcherConfig::Model {
                pattern: "*haiku*".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_label_rejected() {
        let result: Result<RuleConfig, _> = toml::from_str(
            r#"
            label = "cheap"
            target_model = "x"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_default_matchers_per_label() {
        assert_eq!(
            MatcherConfig::for_label(RoutingLabel::LargeContext),
            MatcherConfig::ContextAtLeast { tokens: None }
        );
        assert_eq!(
            MatcherConfig::for_label(RoutingLabel::Default),
            MatcherConfig::Always
        );
        assert_eq!(
            MatcherConfig::for_label(RoutingLabel::Think),
            MatcherConfig::Thinking
        );
    }

    #[test]
    fn test_compile_uses_snapshot_threshold() {
        let rule = RuleConfig {
            label: RoutingLabel::LargeContext,
            target_model: "model-B".to_string(),
            matcher: None,
        };
        let compiled = rule.compile(0, 50_000).unwrap();
        assert!(compiled.matches(&descriptor(50_000, "model-A")));
        assert!(!compiled.matches(&descriptor(49_999, "model-A")));
    }

    #[test]
    fn test_compile_explicit_tokens_override_threshold() {
        let rule = RuleConfig {
            label: RoutingLabel::LargeContext,
            target_model: "model-B".to_string(),
            matcher: Some(MatcherConfig::ContextAtLeast {
                tokens: Some(1_000),
            }),
        };
        let compiled = rule.compile(0, 50_000).unwrap();
        assert!(compiled.matches(&descriptor(1_000, "model-A")));
    }

    #[test]
    fn test_compile_rejects_empty_target() {
        let rule = RuleConfig {
            label: RoutingLabel::Think,
            target_model: "  ".to_string(),
            matcher: None,
        };
        let err = rule.compile(3, 50_000).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation { ref field, .. } if field == "rules[3].target_model"
        ));
    }

    #[test]
    fn test_compile_rejects_bad_glob() {
        let rule = RuleConfig {
            label: RoutingLabel::Background,
            target_model: "small".to_string(),
            matcher: Some(MatcherConfig::Model {
                pattern: "[unclosed".to_string(),
            }),
        };
        assert!(matches!(
            rule.compile(0, 50_000),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_compile_rejects_zero_tokens() {
        let rule = RuleConfig {
            label: RoutingLabel::LargeContext,
            target_model: "big".to_string(),
            matcher: Some(MatcherConfig::ContextAtLeast { tokens: Some(0) }),
        };
        assert!(rule.compile(0, 50_000).is_err());
    }

    #[test]
    fn test_model_glob_matches_requested_model() {
        let rule = RuleConfig {
            label: RoutingLabel::Background,
            target_model: "small".to_string(),
            matcher: Some(MatcherConfig::Model {
                pattern: "claude-3-5-haiku*".to_string(),
            }),
        };
        let compiled = rule.compile(0, 50_000).unwrap();
        assert!(compiled.matches(&descriptor(10, "claude-3-5-haiku-20241022")));
        assert!(!compiled.matches(&descriptor(10, "claude-sonnet-4")));
    }
}
