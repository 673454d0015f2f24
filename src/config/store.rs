//! Live configuration store with atomic snapshot replacement.
//!
//! Readers call [`ConfigStore::current`] on every request; it is a single
//! lock-free pointer load. Writers build a complete [`ConfigSnapshot`] first
//! and swap the pointer only after validation succeeds, so a reader sees
//! either the old snapshot or the new one, never a mix.

use arc_swap::ArcSwap;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::{ConfigError, ConfigSnapshot, ConfigSource};

/// Invoked with the new snapshot after every successful reload.
///
/// Callbacks run on the reloading thread while the commit lock is held, so
/// they see snapshots in commit order. Calling [`ConfigStore::reload`] on the
/// same store from a callback fails with [`ConfigError::ReentrantReload`].
pub type ReloadCallback = Arc<dyn Fn(&Arc<ConfigSnapshot>) + Send + Sync>;

thread_local! {
    /// Address of the store whose callbacks this thread is running, or 0.
    static NOTIFYING: Cell<usize> = const { Cell::new(0) };
}

/// Clears [`NOTIFYING`] even if a callback panics.
struct NotifyingGuard(usize);

impl NotifyingGuard {
    fn enter(store: usize) -> Self {
        Self(NOTIFYING.with(|cell| cell.replace(store)))
    }
}

impl Drop for NotifyingGuard {
    fn drop(&mut self) {
        NOTIFYING.with(|cell| cell.set(self.0));
    }
}

/// Owner of the current routing configuration.
pub struct ConfigStore {
    current: ArcSwap<ConfigSnapshot>,
    callbacks: RwLock<Vec<ReloadCallback>>,
    /// Last version handed out by `load`
    version: AtomicU64,
    /// Serializes commits; never taken by readers
    commit: Mutex<()>,
}

impl ConfigStore {
    /// Create a store serving the built-in initial snapshot.
    pub fn new() -> Self {
        Self::with_snapshot(ConfigSnapshot::initial())
    }

    /// Create a store serving `snapshot`.
    pub fn with_snapshot(snapshot: ConfigSnapshot) -> Self {
        let version = snapshot.version();
        Self {
            current: ArcSwap::from_pointee(snapshot),
            callbacks: RwLock::new(Vec::new()),
            version: AtomicU64::new(version),
            commit: Mutex::new(()),
        }
    }

    /// First load at process start.
    ///
    /// A missing file is not an error: the store keeps the built-in default
    /// snapshot. Malformed or invalid sources are returned to the caller.
    pub fn initialize(source: &ConfigSource) -> Result<Self, ConfigError> {
        let store = Self::new();
        match store.reload(source) {
            Ok(_) => Ok(store),
            Err(ConfigError::NotFound(path)) => {
                tracing::warn!(
                    path = %path.display(),
                    "Config file not found, using built-in defaults"
                );
                Ok(store)
            }
            Err(e) => Err(e),
        }
    }

    /// Parse and validate `source` into a snapshot without installing it.
    pub fn load(&self, source: &ConfigSource) -> Result<ConfigSnapshot, ConfigError> {
        let config = source.read()?;
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        ConfigSnapshot::from_config(config, version)
    }

    /// The most recently committed snapshot. Never blocks.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.current.load_full()
    }

    /// Load `source` and, only if it is valid, swap it in and notify
    /// subscribers. On failure the previous snapshot stays active.
    pub fn reload(&self, source: &ConfigSource) -> Result<Arc<ConfigSnapshot>, ConfigError> {
        if NOTIFYING.with(Cell::get) == self.addr() {
            return Err(ConfigError::ReentrantReload);
        }
        let _guard = self.commit.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = match self.load(source) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                metrics::counter!("ccproxy_config_reloads_total", "outcome" => "rejected")
                    .increment(1);
                if !e.is_not_found() {
                    tracing::warn!(
                        source = %source,
                        error = %e,
                        active_version = self.current.load().version(),
                        "Config reload rejected, keeping current config"
                    );
                }
                return Err(e);
            }
        };

        self.commit_snapshot(Arc::clone(&snapshot));
        metrics::counter!("ccproxy_config_reloads_total", "outcome" => "applied").increment(1);
        tracing::info!(
            source = %source,
            version = snapshot.version(),
            rules = snapshot.rules().len(),
            context_threshold = snapshot.context_threshold(),
            "Config reloaded"
        );
        Ok(snapshot)
    }

    fn commit_snapshot(&self, snapshot: Arc<ConfigSnapshot>) {
        self.current.store(Arc::clone(&snapshot));

        // Clone the list so a callback may subscribe without deadlocking.
        let callbacks: Vec<ReloadCallback> = self
            .callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let _notifying = NotifyingGuard::enter(self.addr());
        for callback in &callbacks {
            callback(&snapshot);
        }
    }

    fn addr(&self) -> usize {
        self as *const Self as usize
    }

    /// Register a callback fired after each successful reload.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&Arc<ConfigSnapshot>) + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    /// Number of registered reload callbacks
    pub fn subscriber_count(&self) -> usize {
        self.callbacks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Restore the initial snapshot and drop all callbacks.
    pub fn reset(&self) {
        let _guard = self.commit.lock().unwrap_or_else(PoisonError::into_inner);
        self.callbacks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.version.store(0, Ordering::SeqCst);
        self.current.store(Arc::new(ConfigSnapshot::initial()));
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("version", &self.current.load().version())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
