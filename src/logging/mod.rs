//! Log filter construction from configuration.

use crate::config::{LogLevel, LoggingConfig};

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels. `debug` (the top-level config
/// flag) raises the base level to at least `debug`.
///
/// # Examples
///
/// ```
/// use ccproxy::config::{LogFormat, LogLevel, LoggingConfig};
/// use ccproxy::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("routing".to_string(), LogLevel::Debug);
///
/// let config = LoggingConfig {
///     level: LogLevel::Info,
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
/// };
///
/// let filter_str = build_filter_directives(&config, false);
/// assert_eq!(filter_str, "info,ccproxy::routing=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig, debug: bool) -> String {
    let base = if debug {
        config.level.min(LogLevel::Debug)
    } else {
        config.level
    };
    let mut filter_str = base.to_string();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",ccproxy::{}={}", component, level));
        }
    }

    filter_str
}
