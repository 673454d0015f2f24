//! Configuration hot-reload watcher.
//!
//! Watches the configuration file for changes and reloads it into the
//! [`ConfigStore`]. Invalid edits are logged and rejected by the store; the
//! active snapshot stays in place.
//!
//! Bursts of file events are debounced into a single reload, and all reloads
//! run sequentially on one task, so two reloads never interleave. Events that
//! arrive while a reload is running are coalesced into the next one.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, ConfigSource, ConfigStore};

/// Quiet period before a burst of events triggers a reload.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

type NotifyResult = Result<Event, notify::Error>;

/// Background task that reloads the store when the config file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConfigWatcher {
    /// Start watching `path`. Must be called inside a tokio runtime.
    ///
    /// The parent directory is watched so editors that save by renaming a
    /// temp file over the original are still seen. If that directory cannot
    /// be watched yet (for example it does not exist), the watcher keeps
    /// retrying with backoff and reloads once the watch is established.
    /// Only failure to create the notify backend is returned.
    pub fn start(
        store: Arc<ConfigStore>,
        path: PathBuf,
        debounce: Duration,
    ) -> Result<Self, ConfigError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let watch_dir = watch_dir(&path);
        let mut watcher = new_watcher(&watch_dir, tx)?;
        let armed = match watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    dir = %watch_dir.display(),
                    error = %e,
                    "Cannot watch config directory yet, retrying"
                );
                false
            }
        };

        let cancel = CancellationToken::new();
        let task = WatchLoop {
            store,
            path: path.clone(),
            watch_dir,
            debounce,
            watcher,
            rx,
            cancel: cancel.clone(),
        };
        let handle = tokio::spawn(task.run(armed));

        tracing::info!(path = %path.display(), armed, "Config watcher started");

        Ok(Self {
            path,
            cancel,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop watching. Idempotent, and safe to call concurrently.
    ///
    /// Waits for a reload that is already running to finish; no reload
    /// callback fires after any call to this returns.
    pub async fn stop(&self) {
        self.cancel.cancel();
        // Held across the join so concurrent callers wait for the task too.
        let mut handle = self.handle.lock().await;
        if let Some(task) = handle.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Config watcher task ended abnormally");
            }
            tracing::info!(path = %self.path.display(), "Config watcher stopped");
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn new_watcher(
    dir: &Path,
    tx: mpsc::UnboundedSender<NotifyResult>,
) -> Result<RecommendedWatcher, ConfigError> {
    RecommendedWatcher::new(
        move |res: NotifyResult| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .map_err(|e| watch_error(dir, e))
}

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_BACKOFF)
}

fn watch_error(dir: &Path, e: notify::Error) -> ConfigError {
    ConfigError::Watch {
        path: dir.to_path_buf(),
        message: e.to_string(),
    }
}

/// Whether `event` is a content change to the file at `path`.
fn touches(event: &Event, path: &Path) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Any
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == path.file_name())
}

struct WatchLoop {
    store: Arc<ConfigStore>,
    path: PathBuf,
    watch_dir: PathBuf,
    debounce: Duration,
    watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<NotifyResult>,
    cancel: CancellationToken,
}

impl WatchLoop {
    async fn run(mut self, armed: bool) {
        if !armed && !self.rearm().await {
            return;
        }
        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.rx.recv() => received,
            };

            match received {
                Some(Ok(event)) if touches(&event, &self.path) => {}
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Config watch error, re-arming");
                    if !self.rearm().await {
                        break;
                    }
                    continue;
                }
                None => break,
            }

            if !self.settle().await {
                break;
            }

            self.reload().await;
        }
        tracing::debug!(path = %self.path.display(), "Config watch loop exited");
    }

    /// Wait until no event has arrived for `debounce`. False on cancel.
    ///
    /// Watch errors in the window re-arm the watch and restart the wait.
    async fn settle(&mut self) -> bool {
        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.debounce) => return true,
                received = self.rx.recv() => received,
            };
            match received {
                None => return true,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Config watch error, re-arming");
                    if !self.rearm().await {
                        return false;
                    }
                }
            }
        }
    }

    async fn reload(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }
        let store = Arc::clone(&self.store);
        let source = ConfigSource::File(self.path.clone());
        // Runs to completion even if stop() is called meanwhile; stop()
        // waits for this task, so the callbacks finish before it returns.
        let outcome = tokio::task::spawn_blocking(move || store.reload(&source)).await;
        match outcome {
            Ok(Ok(_)) => {}
            Ok(Err(ConfigError::NotFound(path))) => {
                tracing::debug!(path = %path.display(), "Config file removed, keeping current config");
            }
            Ok(Err(_)) => {}
            Err(e) => tracing::error!(error = %e, "Config reload task panicked"),
        }
    }

    /// Re-establish the watch with exponential backoff, then reload to
    /// pick up edits made while unwatched. False on cancel.
    async fn rearm(&mut self) -> bool {
        let mut backoff = INITIAL_BACKOFF;
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return false,
                _ = tokio::time::sleep(backoff) => {}
            }

            let _ = self.watcher.unwatch(&self.watch_dir);
            match self
                .watcher
                .watch(&self.watch_dir, RecursiveMode::NonRecursive)
            {
                Ok(()) => {
                    tracing::info!(dir = %self.watch_dir.display(), "Config watch armed");
                    self.reload().await;
                    return true;
                }
                Err(e) => {
                    backoff = next_backoff(backoff);
                    tracing::warn!(
                        dir = %self.watch_dir.display(),
                        error = %e,
                        retry_in_ms = backoff.as_millis() as u64,
                        "Failed to re-arm config watch"
                    );
                }
            }
        }
    }
}
