//! Output formatting helpers for CLI commands

use crate::config::ConfigSnapshot;
use crate::routing::Matcher;
use crate::supervisor::ProcessStatus;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;
use std::path::Path;

/// View model for a compiled routing rule
#[derive(Debug, Clone, serde::Serialize)]
pub struct RuleView {
    pub position: usize,
    pub label: String,
    pub matcher: String,
    pub target_model: String,
    pub available: bool,
}

impl RuleView {
    /// Rule views in evaluation order.
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Vec<RuleView> {
        let catalog = snapshot.model_catalog();
        snapshot
            .rules()
            .iter()
            .enumerate()
            .map(|(i, rule)| RuleView {
                position: i + 1,
                label: rule.label().to_string(),
                matcher: describe_matcher(rule.matcher()),
                target_model: rule.target_model().to_string(),
                available: catalog.is_available(rule.target_model()),
            })
            .collect()
    }
}

/// Human-readable matcher summary
pub fn describe_matcher(matcher: &Matcher) -> String {
    match matcher {
        Matcher::Always => "always".to_string(),
        Matcher::Background => "background model".to_string(),
        Matcher::Thinking => "thinking requested".to_string(),
        Matcher::WebSearch => "web search tool".to_string(),
        Matcher::ContextAtLeast(tokens) => format!("context >= {}", tokens),
        Matcher::Model { pattern, .. } => format!("model ~ {}", pattern),
    }
}

/// Format rules as a table
pub fn format_rules_table(rules: &[RuleView]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Label", "Match", "Target Model", "Available"]);

    for r in rules {
        let available = if r.available {
            "yes".green().to_string()
        } else {
            "no".red().to_string()
        };

        table.add_row(vec![
            Cell::new(r.position),
            Cell::new(&r.label),
            Cell::new(&r.matcher),
            Cell::new(&r.target_model),
            Cell::new(available),
        ]);
    }

    table.to_string()
}

/// Format a config check summary as JSON
pub fn format_check_json(snapshot: &ConfigSnapshot, source: &str) -> String {
    json!({
        "valid": true,
        "source": source,
        "context_threshold": snapshot.context_threshold(),
        "rules": RuleView::from_snapshot(snapshot),
    })
    .to_string()
}

/// Format capture status as a single line
pub fn format_capture_status(status: &ProcessStatus, pid_file: &Path) -> String {
    match status.pid {
        Some(pid) if status.running => format!(
            "{} Capture running (PID {}, pid file {})",
            "●".green(),
            pid,
            pid_file.display()
        ),
        _ => format!("{} Capture not running", "○".dimmed()),
    }
}

/// Format capture status as JSON
pub fn format_capture_status_json(status: &ProcessStatus, pid_file: &Path) -> String {
    json!({
        "running": status.running,
        "pid": status.pid,
        "pid_file": pid_file.display().to_string(),
    })
    .to_string()
}
