//! User-global configuration store with background file refresh.

use crate::config::{EffectiveConfig, PartialConfig};
use crate::config_io::{self, ConfigLayer};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How often the watcher polls the global config file's modification time.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Owns the user-global configuration layer.
///
/// The snapshot is always a complete record: it is seeded from the
/// application defaults at construction and only ever replaced wholesale,
/// so readers never observe a partially written value. The background
/// watcher task is the single writer; a failed reload never replaces a
/// previously good snapshot.
pub struct GlobalConfigStore {
    snapshot: Arc<RwLock<PartialConfig>>,
    config_path: Option<PathBuf>,
    poll_interval: Duration,
    shutdown: watch::Sender<bool>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl GlobalConfigStore {
    /// Create the store and eagerly load the global config file if present.
    ///
    /// `config_path` is `None` when the platform config directory could not
    /// be determined; the store then serves defaults and
    /// [`start_watcher`](Self::start_watcher) is a no-op.
    pub fn new(config_path: Option<PathBuf>, poll_interval: Duration) -> Self {
        let mut seed = PartialConfig::from(EffectiveConfig::default());

        if let Some(path) = &config_path {
            match config_io::load_partial(path) {
                Ok(Some(partial)) => {
                    tracing::info!(
                        "Loaded {:?} config from {}: viewport={:?}, precision={:?}",
                        ConfigLayer::Global,
                        path.display(),
                        partial.viewport_width,
                        partial.unit_precision
                    );
                    seed = partial;
                }
                Ok(None) => {
                    tracing::debug!("No {:?} config at {}", ConfigLayer::Global, path.display());
                }
                Err(e) => {
                    tracing::warn!("Failed to load {:?} config: {e}", ConfigLayer::Global);
                }
            }
        } else {
            tracing::warn!("Config directory unresolvable; using defaults without a watcher");
        }

        let (shutdown, _) = watch::channel(false);
        Self {
            snapshot: Arc::new(RwLock::new(seed)),
            config_path,
            poll_interval,
            shutdown,
            watcher: Mutex::new(None),
        }
    }

    /// Current global layer, copied out whole.
    pub fn get(&self) -> PartialConfig {
        *self.snapshot.read().expect("global config lock poisoned")
    }

    /// Spawn the background refresh task. Must be called from within a tokio
    /// runtime. Does nothing in degraded mode or when already started.
    pub fn start_watcher(&self) {
        let Some(path) = self.config_path.clone() else {
            return;
        };

        let mut guard = self.watcher.lock().expect("watcher handle lock poisoned");
        if guard.is_some() {
            return;
        }

        let snapshot = Arc::clone(&self.snapshot);
        let poll_interval = self.poll_interval;
        let mut shutdown = self.shutdown.subscribe();

        *guard = Some(tokio::spawn(async move {
            let mut last_modified: Option<SystemTime> = None;
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            return;
                        }
                    }
                    _ = ticker.tick() => {
                        poll_once(&path, &snapshot, &mut last_modified);
                    }
                }
            }
        }));
    }

    /// Stop the background refresh task.
    ///
    /// Idempotent and non-blocking: the task observes the signal at its next
    /// wait point. Safe to call when no watcher is running.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// One watcher tick: reload the file if its mtime advanced.
///
/// Every failure path leaves the current snapshot in place; the watcher
/// keeps polling forever regardless of how many reloads fail.
fn poll_once(
    path: &std::path::Path,
    snapshot: &RwLock<PartialConfig>,
    last_modified: &mut Option<SystemTime>,
) {
    let Ok(modified) = std::fs::metadata(path).and_then(|meta| meta.modified()) else {
        return;
    };

    let is_newer = last_modified.is_none_or(|seen| modified > seen);
    if !is_newer {
        return;
    }
    *last_modified = Some(modified);

    match config_io::load_partial(path) {
        Ok(Some(partial)) => {
            *snapshot.write().expect("global config lock poisoned") = partial;
            tracing::info!(
                "Reloaded {:?} config from {}: viewport={:?}, precision={:?}",
                ConfigLayer::Global,
                path.display(),
                partial.viewport_width,
                partial.unit_precision
            );
        }
        Ok(None) => {
            // File vanished between the stat and the read; keep the
            // current snapshot.
        }
        Err(e) => {
            tracing::warn!("Failed to reload {:?} config: {e}", ConfigLayer::Global);
        }
    }
}
