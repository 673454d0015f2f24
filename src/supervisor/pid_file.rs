//! PID file access: the decimal PID is the file's entire content.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::SupervisorError;

/// What a PID file currently says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidFileContent {
    Missing,
    Pid(u32),
    /// Present but not a positive decimal PID
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<PidFileContent, SupervisorError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PidFileContent::Missing),
            Err(e) => return Err(SupervisorError::pid_file(&self.path, e)),
        };
        let trimmed = raw.trim();
        match trimmed.parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(PidFileContent::Pid(pid)),
            _ => Ok(PidFileContent::Invalid(trimmed.to_string())),
        }
    }

    /// Write `pid` via a temp file and rename, creating the parent directory.
    pub fn write(&self, pid: u32) -> Result<(), SupervisorError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| SupervisorError::pid_file(parent, e))?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, pid.to_string()).map_err(|e| SupervisorError::pid_file(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| SupervisorError::pid_file(&self.path, e))
    }

    /// Remove the file; a file that is already gone is not an error.
    pub fn remove(&self) -> Result<(), SupervisorError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SupervisorError::pid_file(&self.path, e)),
        }
    }
}
