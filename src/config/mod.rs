//! Configuration module for ccproxy
//!
//! Provides layered configuration loading from a TOML file, environment
//! variables, and defaults, plus the live [`ConfigStore`] that the routing
//! engine reads on every request.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`CCPROXY_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use ccproxy::config::CcproxyConfig;
//!
//! let config = CcproxyConfig::default();
//! assert_eq!(config.context_threshold, 60_000);
//!
//! let toml = r#"
//! context_threshold = 50000
//!
//! [[rules]]
//! label = "large_context"
//! target_model = "model-B"
//! "#;
//! let config: CcproxyConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.rules.len(), 1);
//! ```

pub mod capture;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod routing;
pub mod server;
pub mod snapshot;
pub mod store;
pub mod watcher;

pub use capture::CaptureConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use metrics::MetricsConfig;
pub use routing::{MatcherConfig, ModelsConfig, RuleConfig};
pub use server::ServerConfig;
pub use snapshot::ConfigSnapshot;
pub use store::{ConfigStore, ReloadCallback};
pub use watcher::ConfigWatcher;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "CCPROXY_CONFIG";

/// Configuration file used when neither the CLI nor the environment name one.
pub const DEFAULT_CONFIG_FILE: &str = "ccproxy.toml";

/// The configuration document as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcproxyConfig {
    /// Token count at or above which a request is `large_context`
    pub context_threshold: u64,
    /// Requested models matching this glob are treated as background calls
    pub background_model_pattern: String,
    /// Lowers the base log level to debug
    pub debug: bool,
    /// Gates the file watcher
    pub reload_config_on_change: bool,
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
    pub models: ModelsConfig,
    pub capture: CaptureConfig,
    /// Evaluated in declaration order; first match wins
    pub rules: Vec<RuleConfig>,
}

impl Default for CcproxyConfig {
    fn default() -> Self {
        Self {
            context_threshold: 60_000,
            background_model_pattern: "*haiku*".to_string(),
            debug: false,
            reload_config_on_change: true,
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
            models: ModelsConfig::default(),
            capture: CaptureConfig::default(),
            rules: Vec::new(),
        }
    }
}

impl CcproxyConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                Self::parse(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse a TOML document
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides
    ///
    /// Supports CCPROXY_* environment variables for common settings.
    /// Invalid values are silently ignored (defaults are kept).
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply `CCPROXY_*` overrides read through `lookup`.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("CCPROXY_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Some(host) = lookup("CCPROXY_HOST") {
            self.server.host = host;
        }
        if let Some(level) = lookup("CCPROXY_LOG_LEVEL") {
            if let Ok(l) = level.parse() {
                self.logging.level = l;
            }
        }
        if let Some(format) = lookup("CCPROXY_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    ///
    /// Rule compilation is validated by [`ConfigSnapshot::from_config`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_threshold == 0 {
            return Err(ConfigError::validation(
                "context_threshold",
                "threshold must be greater than zero",
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "port must be non-zero",
            ));
        }

        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(ConfigError::validation(
                "metrics.port",
                "port must be non-zero when metrics are enabled",
            ));
        }

        if let Err(e) = globset::Glob::new(&self.background_model_pattern) {
            return Err(ConfigError::validation(
                "background_model_pattern",
                e.to_string(),
            ));
        }

        if self.capture.command.trim().is_empty() {
            return Err(ConfigError::validation(
                "capture.command",
                "command cannot be empty",
            ));
        }

        Ok(())
    }
}

/// Where a configuration document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// In-memory TOML, mostly for tests and `config check`
    Inline(String),
}

impl ConfigSource {
    /// Resolve the configuration path: explicit path, then `CCPROXY_CONFIG`,
    /// then `ccproxy.toml` in the working directory.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return ConfigSource::File(path.to_path_buf());
        }
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => ConfigSource::File(PathBuf::from(path)),
            _ => ConfigSource::File(PathBuf::from(DEFAULT_CONFIG_FILE)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::File(path) => Some(path),
            ConfigSource::Inline(_) => None,
        }
    }

    /// Read and parse the document, applying environment overrides.
    pub fn read(&self) -> Result<CcproxyConfig, ConfigError> {
        let config = match self {
            ConfigSource::File(path) => CcproxyConfig::load(Some(path))?,
            ConfigSource::Inline(content) => CcproxyConfig::parse(content)?,
        };
        Ok(config.with_env_overrides())
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Inline(_) => f.write_str("<inline>"),
        }
    }
}
