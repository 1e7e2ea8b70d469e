//! File watcher with health monitoring.
//!
//! The watcher is armed on the project root once a load finds at least one
//! resource file, and disarmed when a load finds none.
//!
//! ## Architecture
//!
//! - `WatcherManager` owns the notify watcher and arms or disarms it
//! - `WatcherState` tracks health status for reporting
//! - `WatcherEvent` is sent to the reload loop

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use eyre::{Result, WrapErr};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

// ============================================================================
// Watcher Events
// ============================================================================

/// Events sent from the watcher to the reload loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    /// A file was created or its content changed.
    Changed(PathBuf),

    /// A file was renamed; both ends are known.
    Renamed { from: PathBuf, to: PathBuf },

    /// A file was deleted or moved out of sight.
    Removed(PathBuf),
}

impl WatcherEvent {
    /// Translate a raw notify event into reload events.
    ///
    /// Access and metadata-only events produce nothing.
    pub fn from_notify(event: &Event) -> Vec<WatcherEvent> {
        let paths = event.paths.iter().cloned();
        match event.kind {
            EventKind::Create(_) => paths.map(WatcherEvent::Changed).collect(),
            EventKind::Remove(_) => paths.map(WatcherEvent::Removed).collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match event.paths.as_slice() {
                [from, to] => vec![WatcherEvent::Renamed {
                    from: from.clone(),
                    to: to.clone(),
                }],
                _ => paths.map(WatcherEvent::Changed).collect(),
            },
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                paths.map(WatcherEvent::Removed).collect()
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
            EventKind::Modify(_) => paths.map(WatcherEvent::Changed).collect(),
            EventKind::Any | EventKind::Other => paths.map(WatcherEvent::Changed).collect(),
            EventKind::Access(_) => Vec::new(),
        }
    }
}

// ============================================================================
// Watcher State (Health Monitoring)
// ============================================================================

/// Shared state for monitoring watcher health.
///
/// Shared between the notify callback and the engine so status can be
/// reported without touching the watcher itself.
pub struct WatcherState {
    /// Whether the watcher is currently armed.
    armed: AtomicBool,

    /// Timestamp of last file change event (millis since UNIX epoch).
    last_event_ms: AtomicU64,

    /// Count of file change events received.
    event_count: AtomicU64,

    /// Currently watched directories.
    watched_dirs: RwLock<Vec<PathBuf>>,

    /// Error message if arming failed (None if healthy).
    error: RwLock<Option<String>>,
}

impl WatcherState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark the watcher as armed on the given directories.
    pub fn mark_armed(&self, dirs: Vec<PathBuf>) {
        self.armed.store(true, Ordering::SeqCst);
        *self.watched_dirs.write().unwrap_or_else(PoisonError::into_inner) = dirs;
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Mark the watcher as disarmed (nothing to watch).
    pub fn mark_disarmed(&self) {
        self.armed.store(false, Ordering::SeqCst);
        self.watched_dirs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Mark the watcher as failed with an error message.
    pub fn mark_failed(&self, error: String) {
        self.mark_disarmed();
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = Some(error);
    }

    /// Record that a file change event was received.
    pub fn record_event(&self) {
        self.event_count.fetch_add(1, Ordering::SeqCst);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        self.last_event_ms.store(now, Ordering::SeqCst);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// Get the last event timestamp (millis since epoch), or None if no events.
    pub fn last_event_ms(&self) -> Option<u64> {
        let ms = self.last_event_ms.load(Ordering::SeqCst);
        if ms == 0 { None } else { Some(ms) }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::SeqCst)
    }

    pub fn watched_dirs(&self) -> Vec<PathBuf> {
        self.watched_dirs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn error(&self) -> Option<String> {
        self.error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for WatcherState {
    fn default() -> Self {
        Self {
            armed: AtomicBool::new(false),
            last_event_ms: AtomicU64::new(0),
            event_count: AtomicU64::new(0),
            watched_dirs: RwLock::new(Vec::new()),
            error: RwLock::new(None),
        }
    }
}

// ============================================================================
// Watcher Manager
// ============================================================================

/// Owns the notify watcher and forwards its events to the reload loop.
pub struct WatcherManager {
    /// The armed watcher; `None` while disarmed.
    watcher: Option<RecommendedWatcher>,

    /// Root currently being watched.
    root: Option<PathBuf>,

    state: Arc<WatcherState>,

    events: mpsc::UnboundedSender<WatcherEvent>,
}

impl WatcherManager {
    /// Create a disarmed manager. Events go to `events` once armed.
    pub fn new(state: Arc<WatcherState>, events: mpsc::UnboundedSender<WatcherEvent>) -> Self {
        Self {
            watcher: None,
            root: None,
            state,
            events,
        }
    }

    /// Watch `root` recursively. Re-arming on the same root is a no-op.
    pub fn arm(&mut self, root: &Path) -> Result<()> {
        if self.watcher.is_some() && self.root.as_deref() == Some(root) {
            debug!("Watcher already armed on {}", root.display());
            return Ok(());
        }
        self.disarm();

        let state = Arc::clone(&self.state);
        let events = self.events.clone();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for event in WatcherEvent::from_notify(&event) {
                        state.record_event();
                        if events.send(event).is_err() {
                            debug!("Reload loop is gone, dropping watcher event");
                        }
                    }
                }
                Err(e) => warn!("Watcher error: {}", e),
            }
        })
        .wrap_err("Failed to create file watcher")?;

        if let Err(e) = watcher
            .watch(root, RecursiveMode::Recursive)
            .wrap_err_with(|| format!("Failed to watch {}", root.display()))
        {
            self.state.mark_failed(format!("{e:#}"));
            return Err(e);
        }

        info!("Watching directory: {}", root.display());
        self.watcher = Some(watcher);
        self.root = Some(root.to_path_buf());
        self.state.mark_armed(vec![root.to_path_buf()]);
        Ok(())
    }

    /// Stop watching. Safe to call when already disarmed.
    pub fn disarm(&mut self) {
        if let Some(root) = self.root.take() {
            info!("Stopped watching: {}", root.display());
        }
        self.watcher = None;
        self.state.mark_disarmed();
    }

    pub fn is_armed(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn state(&self) -> &Arc<WatcherState> {
        &self.state
    }
}

// ============================================================================
// Tests
// ============================================================================
