//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn ccproxy_cmd() -> Command {
    let mut cmd = Command::cargo_bin("ccproxy").unwrap();
    for var in [
        "CCPROXY_CONFIG",
        "CCPROXY_PORT",
        "CCPROXY_HOST",
        "CCPROXY_LOG_LEVEL",
        "CCPROXY_LOG_FORMAT",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn capture_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("ccproxy.toml");
    std::fs::write(
        &path,
        format!(
            "[capture]\ncommand = \"sleep\"\nargs = [\"30\"]\npid_file = \"{}\"\nlog_file = \"{}\"\n",
            dir.path().join("capture.pid").display(),
            dir.path().join("capture.log").display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_version_output() {
    ccproxy_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ccproxy"));
}

#[test]
fn test_help_shows_all_commands() {
    ccproxy_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("capture"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_serve_help() {
    ccproxy_cmd()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--no-watch"));
}

#[test]
fn test_config_init_then_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ccproxy.toml");

    ccproxy_cmd()
        .args(["config", "init", "-o"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    ccproxy_cmd()
        .args(["config", "check", "--json", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\":true"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ccproxy.toml");
    std::fs::write(&path, "existing").unwrap();

    ccproxy_cmd()
        .args(["config", "init", "-o"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_config_check_reports_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ccproxy.toml");
    std::fs::write(&path, "background_model_pattern = \"[\"\n").unwrap();

    ccproxy_cmd()
        .args(["config", "check", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("background_model_pattern"));
}

#[test]
fn test_config_check_honours_env_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("elsewhere.toml");
    std::fs::write(&path, "context_threshold = 1234\n").unwrap();

    ccproxy_cmd()
        .args(["config", "check", "--json"])
        .env("CCPROXY_CONFIG", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"context_threshold\":1234"));
}

#[test]
fn test_capture_status_when_not_running() {
    let dir = TempDir::new().unwrap();
    let path = capture_config(&dir);

    ccproxy_cmd()
        .args(["capture", "status", "--json", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"running\":false"));
}

#[test]
fn test_capture_status_cleans_stale_pid_file() {
    let dir = TempDir::new().unwrap();
    let path = capture_config(&dir);
    let pid_file = dir.path().join("capture.pid");
    std::fs::write(&pid_file, "not-a-pid").unwrap();

    ccproxy_cmd()
        .args(["capture", "status", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));

    assert!(!pid_file.exists());
}

#[test]
fn test_capture_stop_when_not_running() {
    let dir = TempDir::new().unwrap();
    let path = capture_config(&dir);

    ccproxy_cmd()
        .args(["capture", "stop", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}
