//! Capture command handlers

use crate::cli::output::{format_capture_status, format_capture_status_json};
use crate::cli::{CaptureArgs, CaptureStopArgs, ConfigArg};
use crate::config::{CaptureConfig, ConfigSource};
use crate::supervisor::{capture_spawner, ProcessSupervisor};
use colored::Colorize;
use serde_json::json;
use std::time::Duration;

/// Capture settings from the resolved config file, or defaults when the
/// file does not exist.
pub fn load_capture_config(arg: &ConfigArg) -> Result<CaptureConfig, Box<dyn std::error::Error>> {
    let source = ConfigSource::resolve(arg.config.as_deref());
    match source.read() {
        Ok(config) => {
            config.validate()?;
            Ok(config.capture)
        }
        Err(e) if e.is_not_found() => {
            tracing::debug!(source = %source, "Config file not found, using capture defaults");
            Ok(CaptureConfig::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Handle `ccproxy capture start` command
pub fn handle_capture_start(args: &CaptureArgs) -> Result<String, Box<dyn std::error::Error>> {
    let capture = load_capture_config(&args.config)?;
    let supervisor = ProcessSupervisor::new(&capture.pid_file);
    let handle = supervisor.start(capture_spawner(&capture))?;

    tracing::info!(pid = handle.pid, command = %capture.command, "Capture process started");

    if args.json {
        return Ok(serde_json::to_string(&handle)?);
    }
    Ok(format!(
        "{} Capture started (PID {})\n  Logs: {}",
        "✓".green(),
        handle.pid,
        capture.log_file.display()
    ))
}

/// Handle `ccproxy capture stop` command
pub fn handle_capture_stop(args: &CaptureStopArgs) -> Result<String, Box<dyn std::error::Error>> {
    let capture = load_capture_config(&args.config)?;
    let supervisor = ProcessSupervisor::new(&capture.pid_file);
    let stopped = supervisor.stop_with_timeout(Duration::from_millis(args.timeout_ms))?;

    if stopped {
        tracing::info!("Capture process stopped");
        Ok(format!("{} Capture stopped", "✓".green()))
    } else {
        Ok(format!("{} Capture was not running", "○".dimmed()))
    }
}

/// Handle `ccproxy capture status` command
pub fn handle_capture_status(args: &CaptureArgs) -> Result<String, Box<dyn std::error::Error>> {
    let capture = load_capture_config(&args.config)?;
    let supervisor = ProcessSupervisor::new(&capture.pid_file);
    let status = supervisor.status()?;

    if args.json {
        Ok(format_capture_status_json(&status, supervisor.pid_file_path()))
    } else {
        Ok(format_capture_status(&status, supervisor.pid_file_path()))
    }
}

/// JSON for a failed capture command, so `--json` callers always get JSON.
pub fn capture_error_json(error: &dyn std::error::Error) -> String {
    json!({ "error": error.to_string() }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn write_config(dir: &Path, command: &str, args: &[&str]) -> PathBuf {
        let path = dir.join("ccproxy.toml");
        let args = args
            .iter()
            .map(|a| format!("\"{}\"", a))
            .collect::<Vec<_>>()
            .join(", ");
        std::fs::write(
            &path,
            format!(
                "[capture]\ncommand = \"{}\"\nargs = [{}]\npid_file = \"{}\"\nlog_file = \"{}\"\n",
                command,
                args,
                dir.join("capture.pid").display(),
                dir.join("capture.log").display()
            ),
        )
        .unwrap();
        path
    }

    fn capture_args(path: &Path, json: bool) -> CaptureArgs {
        CaptureArgs {
            config: ConfigArg {
                config: Some(path.to_path_buf()),
            },
            json,
        }
    }

    #[test]
    fn test_load_capture_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let arg = ConfigArg {
            config: Some(dir.path().join("absent.toml")),
        };
        let capture = load_capture_config(&arg).unwrap();
        assert_eq!(capture, CaptureConfig::default());
    }

    #[test]
    fn test_load_capture_config_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ccproxy.toml");
        std::fs::write(&path, "[capture\n").unwrap();
        let arg = ConfigArg { config: Some(path) };
        assert!(load_capture_config(&arg).is_err());
    }

    #[test]
    fn test_capture_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "sleep", &["30"]);

        let started = handle_capture_start(&capture_args(&path, true)).unwrap();
        let handle: serde_json::Value = serde_json::from_str(&started).unwrap();
        assert!(handle["pid"].as_u64().unwrap() > 0);

        let status = handle_capture_status(&capture_args(&path, true)).unwrap();
        let status: serde_json::Value = serde_json::from_str(&status).unwrap();
        assert_eq!(status["running"], true);
        assert_eq!(status["pid"], handle["pid"]);

        assert!(handle_capture_start(&capture_args(&path, false)).is_err());

        let stop_args = CaptureStopArgs {
            config: ConfigArg {
                config: Some(path.clone()),
            },
            timeout_ms: 500,
        };
        let output = handle_capture_stop(&stop_args).unwrap();
        assert!(output.contains("stopped"));
        assert!(!dir.path().join("capture.pid").exists());

        let output = handle_capture_stop(&stop_args).unwrap();
        assert!(output.contains("not running"));
    }

    #[test]
    fn test_capture_status_not_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "sleep", &["30"]);
        let output = handle_capture_status(&capture_args(&path, false)).unwrap();
        assert!(output.contains("not running"));
    }

    #[test]
    fn test_capture_error_json() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let parsed: serde_json::Value = serde_json::from_str(&capture_error_json(&err)).unwrap();
        assert_eq!(parsed["error"], "boom");
    }
}
