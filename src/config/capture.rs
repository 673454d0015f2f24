//! Traffic-capture process configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to launch the auxiliary traffic-capture process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Executable to run
    pub command: String,
    pub args: Vec<String>,
    /// Where the supervisor records the capture PID
    pub pid_file: PathBuf,
    /// stdout/stderr of the capture process are appended here
    pub log_file: PathBuf,
}

impl CaptureConfig {
    pub fn runtime_dir() -> PathBuf {
        std::env::temp_dir().join("ccproxy")
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        let dir = Self::runtime_dir();
        Self {
            command: "mitmdump".to_string(),
            args: vec!["--listen-port".to_string(), "8081".to_string()],
            pid_file: dir.join("capture.pid"),
            log_file: dir.join("capture.log"),
        }
    }
}
