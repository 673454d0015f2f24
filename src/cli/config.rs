//! Config command handlers

use crate::cli::output::{format_check_json, format_rules_table, RuleView};
use crate::cli::{ConfigCheckArgs, ConfigInitArgs};
use crate::config::{ConfigSource, ConfigStore};
use colored::Colorize;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../ccproxy.example.toml");

/// Handle `ccproxy config init` command
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File already exists: {}. Use --force to overwrite.",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    println!("✓ Configuration file created: {}", args.output.display());
    println!("  Edit the [[rules]] entries to choose target models.");

    Ok(())
}

/// Handle `ccproxy config check` command
///
/// Unlike `serve`, a missing file is an error here.
pub fn handle_config_check(args: &ConfigCheckArgs) -> Result<String, Box<dyn std::error::Error>> {
    let source = ConfigSource::resolve(args.config.config.as_deref());
    let snapshot = ConfigStore::new().load(&source)?;

    if args.json {
        return Ok(format_check_json(&snapshot, &source.to_string()));
    }

    let rules = RuleView::from_snapshot(&snapshot);
    let mut out = format!(
        "{} {} is valid (context_threshold = {}, {} rule{})\n",
        "✓".green(),
        source,
        snapshot.context_threshold(),
        rules.len(),
        if rules.len() == 1 { "" } else { "s" }
    );
    if rules.is_empty() {
        out.push_str("  No rules configured: every request passes through.\n");
    } else {
        out.push_str(&format_rules_table(&rules));
    }
    Ok(out)
}
