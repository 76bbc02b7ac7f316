//! Hot-reloadable configuration snapshot
//!
//! [`ConfigStore`] owns the active [`Config`] behind a lock-guarded `Arc`.
//! Readers clone the `Arc` and keep a complete, immutable snapshot for as long
//! as they need it; a reload parses a whole new document and swaps the
//! pointer, so a half-parsed config is never visible.
//!
//! [`ConfigStore::watch`] polls the backing file's modification time on a
//! background task and reloads when it changes. The task runs until the
//! returned [`ConfigWatchHandle`] is stopped.

use crate::config::Config;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// How often the config file's modification time is checked
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Owner of the active configuration snapshot
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<Arc<Config>>,
}

impl ConfigStore {
    /// Create a store for `path` holding the default (empty) configuration
    ///
    /// Nothing is read until [`ConfigStore::load`] is called.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_config(path, Config::default())
    }

    /// Create a store with an initial snapshot
    pub fn with_config<P: Into<PathBuf>>(path: P, config: Config) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// Path of the backing config file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current snapshot
    pub fn get(&self) -> Arc<Config> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the active snapshot
    pub fn replace(&self, config: Config) {
        let config = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    /// Reload the config file
    ///
    /// On success the new snapshot becomes active. On failure the error is
    /// logged and the previous snapshot stays active. Returns whether the
    /// snapshot was replaced.
    pub fn load(&self) -> bool {
        match Config::load(&self.path) {
            Ok(config) => {
                if let Err(e) = config.validate() {
                    warn!(path = %self.path.display(), "Config loaded with problems: {}", e);
                }
                self.replace(config);
                info!(path = %self.path.display(), "Reloaded config");
                true
            }
            Err(e) => {
                error!(path = %self.path.display(), "Failed to load config: {:#}", e);
                false
            }
        }
    }

    /// Start polling the config file every [`DEFAULT_POLL_INTERVAL`]
    pub fn watch(self: &Arc<Self>) -> ConfigWatchHandle {
        self.watch_with_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Start polling the config file at a custom interval
    ///
    /// Must be called from within a Tokio runtime.
    pub fn watch_with_interval(self: &Arc<Self>, interval: Duration) -> ConfigWatchHandle {
        let (stop_tx, stop_rx) = mpsc::channel::<()>(1);
        let store = Arc::clone(self);

        let task = tokio::spawn(async move {
            run_watcher(store, interval, stop_rx).await;
        });

        ConfigWatchHandle { stop_tx, task }
    }
}

/// Handle to the background config watcher
#[derive(Debug)]
pub struct ConfigWatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl ConfigWatchHandle {
    /// Stop the watcher and wait for its task to finish
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }

    /// True once the watcher task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn modified_time(path: &Path) -> Option<SystemTime> {
    tokio::fs::metadata(path).await.and_then(|m| m.modified()).ok()
}

async fn run_watcher(store: Arc<ConfigStore>, interval: Duration, mut stop_rx: mpsc::Receiver<()>) {
    // Seeded after the startup load, so only later edits trigger a reload.
    let mut last_modified = modified_time(store.path()).await;

    debug!(
        path = %store.path().display(),
        interval_ms = interval.as_millis() as u64,
        "Watching config file"
    );

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                info!("Config watcher stopping");
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }

        // Unreadable metadata counts as "no change".
        let Some(modified) = modified_time(store.path()).await else {
            continue;
        };

        if last_modified != Some(modified) {
            debug!(path = %store.path().display(), "Config file modified");
            // File I/O and parsing stay off the async worker threads.
            let reloader = Arc::clone(&store);
            if let Err(e) = tokio::task::spawn_blocking(move || reloader.load()).await {
                warn!("Config reload task failed: {}", e);
            }
            last_modified = Some(modified);
        }
    }
}
