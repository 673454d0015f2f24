//! Supervisor error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the capture-process lifecycle commands.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Process already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("Process is not running")]
    NotRunning,

    /// Reading, writing, or removing the PID file failed
    #[error("PID file {path}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Failed to signal pid {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::Error,
    },
}

impl SupervisorError {
    pub(crate) fn pid_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SupervisorError::PidFile {
            path: path.into(),
            source,
        }
    }
}
