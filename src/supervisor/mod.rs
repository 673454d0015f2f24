//! Lifecycle management for the auxiliary traffic-capture process.
//!
//! The supervisor keeps no state of its own: the PID file is the record of
//! what is running, so a restarted supervisor picks up where the last one
//! left off. A process moves `Stopped → Starting → Running → Stopping →
//! Stopped`; a PID file naming a dead process is stale and is removed
//! whenever it is observed.
//!
//! Unix only: liveness and termination use POSIX signals.

mod error;
mod pid_file;

pub use error::SupervisorError;
pub use pid_file::{PidFile, PidFileContent};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use serde::Serialize;
use std::fs::OpenOptions;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::CaptureConfig;

/// How long `stop` waits after SIGTERM before sending SIGKILL.
pub const DEFAULT_GRACEFUL_TIMEOUT: Duration = Duration::from_millis(500);

const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// Upper bound on waiting for a SIGKILLed process to disappear.
const KILL_SETTLE: Duration = Duration::from_millis(500);

/// Result of [`ProcessSupervisor::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessStatus {
    pub running: bool,
    pub pid: Option<u32>,
}

impl ProcessStatus {
    fn stopped() -> Self {
        Self {
            running: false,
            pid: None,
        }
    }

    fn running(pid: u32) -> Self {
        Self {
            running: true,
            pid: Some(pid),
        }
    }
}

/// A process started by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessHandle {
    pub pid: u32,
    pub pid_file_path: PathBuf,
}

/// Starts, stops, and probes one process tracked through a PID file.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    pid_file: PidFile,
    graceful_timeout: Duration,
}

impl ProcessSupervisor {
    pub fn new(pid_file_path: impl Into<PathBuf>) -> Self {
        Self {
            pid_file: PidFile::new(pid_file_path),
            graceful_timeout: DEFAULT_GRACEFUL_TIMEOUT,
        }
    }

    pub fn with_graceful_timeout(mut self, timeout: Duration) -> Self {
        self.graceful_timeout = timeout;
        self
    }

    pub fn pid_file_path(&self) -> &Path {
        self.pid_file.path()
    }

    /// Whether the recorded process is alive. Removes stale PID files.
    pub fn status(&self) -> Result<ProcessStatus, SupervisorError> {
        match self.pid_file.read()? {
            PidFileContent::Missing => Ok(ProcessStatus::stopped()),
            PidFileContent::Invalid(content) => {
                tracing::warn!(
                    path = %self.pid_file.path().display(),
                    content = %content,
                    "Removing unreadable PID file"
                );
                self.pid_file.remove()?;
                Ok(ProcessStatus::stopped())
            }
            PidFileContent::Pid(pid) => {
                if is_alive(pid)? {
                    Ok(ProcessStatus::running(pid))
                } else {
                    tracing::info!(pid, "Removing stale PID file");
                    self.pid_file.remove()?;
                    Ok(ProcessStatus::stopped())
                }
            }
        }
    }

    /// PID of the running process, or `NotRunning`.
    pub fn running_pid(&self) -> Result<u32, SupervisorError> {
        match self.status()? {
            ProcessStatus { pid: Some(pid), .. } => Ok(pid),
            _ => Err(SupervisorError::NotRunning),
        }
    }

    /// Spawn via `spawn` and record the PID it returns.
    ///
    /// Fails with `AlreadyRunning` without calling `spawn` when the recorded
    /// process is alive.
    pub fn start<F>(&self, spawn: F) -> Result<ProcessHandle, SupervisorError>
    where
        F: FnOnce() -> std::io::Result<u32>,
    {
        if let ProcessStatus { pid: Some(pid), .. } = self.status()? {
            return Err(SupervisorError::AlreadyRunning { pid });
        }

        let pid = spawn().map_err(SupervisorError::Spawn)?;

        if let Err(e) = self.pid_file.write(pid) {
            // An unrecorded process could never be stopped through us.
            tracing::error!(pid, error = %e, "Failed to record PID, killing process");
            let _ = signal(pid, Signal::SIGKILL);
            let _ = wait_for_exit(pid, KILL_SETTLE);
            return Err(e);
        }

        tracing::info!(
            pid,
            pid_file = %self.pid_file.path().display(),
            "Started supervised process"
        );
        Ok(ProcessHandle {
            pid,
            pid_file_path: self.pid_file.path().to_path_buf(),
        })
    }

    /// Stop with the configured graceful timeout.
    pub fn stop(&self) -> Result<bool, SupervisorError> {
        self.stop_with_timeout(self.graceful_timeout)
    }

    /// SIGTERM, wait up to `graceful_timeout`, then SIGKILL.
    ///
    /// Returns `true` when a live process was signalled and `false` when
    /// nothing was running (including a stale PID file, which is removed).
    /// Blocks the calling thread for up to `graceful_timeout`.
    pub fn stop_with_timeout(&self, graceful_timeout: Duration) -> Result<bool, SupervisorError> {
        let pid = match self.pid_file.read()? {
            PidFileContent::Pid(pid) => pid,
            PidFileContent::Missing => return Ok(false),
            PidFileContent::Invalid(_) => {
                self.pid_file.remove()?;
                return Ok(false);
            }
        };

        if !is_alive(pid)? {
            tracing::info!(pid, "Process already gone, removing stale PID file");
            self.pid_file.remove()?;
            return Ok(false);
        }

        tracing::info!(pid, timeout_ms = graceful_timeout.as_millis() as u64, "Sending SIGTERM");
        signal(pid, Signal::SIGTERM)?;

        if !wait_for_exit(pid, graceful_timeout)? {
            tracing::warn!(pid, "Process ignored SIGTERM, sending SIGKILL");
            signal(pid, Signal::SIGKILL)?;
            if !wait_for_exit(pid, KILL_SETTLE)? {
                tracing::warn!(pid, "Process still visible after SIGKILL");
            }
        }

        self.pid_file.remove()?;
        tracing::info!(pid, "Supervised process stopped");
        Ok(true)
    }
}

fn to_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

/// Non-destructive liveness probe.
///
/// Reaps the process first if it is our own exited child, so a zombie does
/// not count as alive. `EPERM` means it exists under another user.
fn is_alive(pid: u32) -> Result<bool, SupervisorError> {
    let Some(target) = to_pid(pid) else {
        return Ok(false);
    };

    if let Ok(WaitStatus::Exited(..) | WaitStatus::Signaled(..)) =
        waitpid(target, Some(WaitPidFlag::WNOHANG))
    {
        return Ok(false);
    }

    match kill(target, None) {
        Ok(()) | Err(Errno::EPERM) => Ok(true),
        Err(Errno::ESRCH) => Ok(false),
        Err(source) => Err(SupervisorError::Signal { pid, source }),
    }
}

/// Send `sig`; a process that vanished meanwhile is not an error.
fn signal(pid: u32, sig: Signal) -> Result<(), SupervisorError> {
    let Some(target) = to_pid(pid) else {
        return Ok(());
    };
    match kill(target, sig) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(source) => Err(SupervisorError::Signal { pid, source }),
    }
}

/// Poll until `pid` is gone or `timeout` elapses. True if it exited.
fn wait_for_exit(pid: u32, timeout: Duration) -> Result<bool, SupervisorError> {
    let deadline = Instant::now() + timeout;
    loop {
        if !is_alive(pid)? {
            return Ok(true);
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(false);
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Spawner for the configured capture command.
///
/// The process gets its own process group, so a Ctrl-C aimed at the CLI does
/// not reach it, and its output is appended to `log_file`.
pub fn capture_spawner(config: &CaptureConfig) -> impl FnOnce() -> std::io::Result<u32> + '_ {
    move || {
        if let Some(parent) = config.log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file)?;
        let child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log)
            .process_group(0)
            .spawn()?;
        Ok(child.id())
    }
}
