//! Immutable, versioned view of the routing configuration.

use chrono::{DateTime, Utc};
use globset::{Glob, GlobMatcher};

use crate::config::{CcproxyConfig, ConfigError};
use crate::routing::{ModelCatalog, RoutingRule};

/// A validated configuration with its rules compiled.
///
/// Never mutated after construction; the [`ConfigStore`](super::ConfigStore)
/// replaces it wholesale on reload.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    version: u64,
    loaded_at: DateTime<Utc>,
    config: CcproxyConfig,
    rules: Vec<RoutingRule>,
    background: Option<GlobMatcher>,
    catalog: ModelCatalog,
}

impl ConfigSnapshot {
    /// Validate `config` and compile its rules.
    pub fn from_config(config: CcproxyConfig, version: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let rules = config
            .rules
            .iter()
            .enumerate()
            .map(|(i, rule)| rule.compile(i, config.context_threshold))
            .collect::<Result<Vec<_>, _>>()?;

        let background = Glob::new(&config.background_model_pattern)
            .map_err(|e| ConfigError::validation("background_model_pattern", e.to_string()))?
            .compile_matcher();

        let catalog = ModelCatalog::new(config.models.unavailable_set());

        Ok(Self {
            version,
            loaded_at: Utc::now(),
            config,
            rules,
            background: Some(background),
            catalog,
        })
    }

    /// The built-in snapshot served before anything is loaded: no rules,
    /// so every request passes through.
    pub fn initial() -> Self {
        let config = CcproxyConfig::default();
        let background = Glob::new(&config.background_model_pattern)
            .ok()
            .map(|g| g.compile_matcher());
        Self {
            version: 0,
            loaded_at: Utc::now(),
            catalog: ModelCatalog::default(),
            rules: Vec::new(),
            background,
            config,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn config(&self) -> &CcproxyConfig {
        &self.config
    }

    /// Compiled rules in evaluation order
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    pub fn context_threshold(&self) -> u64 {
        self.config.context_threshold
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    pub fn reload_on_change(&self) -> bool {
        self.config.reload_config_on_change
    }

    pub fn metrics_enabled(&self) -> bool {
        self.config.metrics.enabled
    }

    /// True when `model` should be treated as a background call.
    pub fn is_background_model(&self, model: &str) -> bool {
        self.background
            .as_ref()
            .is_some_and(|glob| glob.is_match(model))
    }

    /// Availability lookup derived from `[models] unavailable`.
    pub fn model_catalog(&self) -> &ModelCatalog {
        &self.catalog
    }
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
