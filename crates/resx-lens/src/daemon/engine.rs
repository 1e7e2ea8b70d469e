//! Core engine for the resx-lens daemon.
//!
//! The engine owns the shared resource store and the file watcher. A full
//! load marks the store as not ready, parses every discovered file off the
//! async runtime, publishes the new store in one swap and then arms or
//! disarms the watcher depending on whether anything loaded.

use eyre::{Result, WrapErr};
use resx_lens_core::{
    FsLoader, LoadReport, ResourceLoader, ResourceStore, SharedStore, WalkResources,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::reload::{Delay, ReloadCoordinator};
use super::watcher::{WatcherEvent, WatcherManager, WatcherState};
use crate::config::Config;

/// The core resx-lens engine.
pub struct Engine<L = FsLoader> {
    /// Store shared with every view and the reload coordinator
    shared: Arc<SharedStore>,
    /// Project root directory (canonical when it exists)
    root: PathBuf,
    config: Config,
    loader: Arc<L>,
    watcher: Mutex<WatcherManager>,
    watcher_state: Arc<WatcherState>,
}

impl Engine<FsLoader> {
    /// Engine reading resource files from disk
    pub fn from_disk(
        root: impl Into<PathBuf>,
        config: Config,
    ) -> (Self, mpsc::UnboundedReceiver<WatcherEvent>) {
        Self::new(root, config, FsLoader)
    }
}

impl<L: ResourceLoader + 'static> Engine<L> {
    /// Create an engine for the given project root.
    ///
    /// Watcher events arrive on the returned receiver once a load armed the
    /// watcher.
    pub fn new(
        root: impl Into<PathBuf>,
        config: Config,
        loader: L,
    ) -> (Self, mpsc::UnboundedReceiver<WatcherEvent>) {
        let root = root.into();
        // notify reports canonical paths; keep the root comparable with them
        let root = root.canonicalize().unwrap_or(root);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let watcher_state = WatcherState::new();
        let watcher = WatcherManager::new(Arc::clone(&watcher_state), events_tx);

        let engine = Self {
            shared: SharedStore::new(ResourceStore::new(config.preferred_culture.clone())),
            root,
            config,
            loader: Arc::new(loader),
            watcher: Mutex::new(watcher),
            watcher_state,
        };
        (engine, events_rx)
    }

    /// Discover every resource file under the root and load them.
    pub async fn load_all(&self) -> Result<LoadReport> {
        let walker = WalkResources::new(&self.root)
            .extension(&self.config.extension)
            .exclude(self.config.exclude.iter().cloned());
        let paths = tokio::task::spawn_blocking(move || walker.discover())
            .await
            .wrap_err("Discovery task failed")??;
        self.load_paths(paths).await
    }

    /// Replace the store with exactly these files.
    ///
    /// Files that fail to parse are skipped and listed in the report.
    pub async fn load_paths(&self, paths: Vec<PathBuf>) -> Result<LoadReport> {
        let start = Instant::now();
        let _guard = self.shared.begin_update();

        let loader = Arc::clone(&self.loader);
        let root = self.root.clone();
        let culture = self.config.preferred_culture.clone();
        let (store, report) = tokio::task::spawn_blocking(move || {
            let mut store = ResourceStore::default();
            let report = store.load_all(&paths, &root, culture.as_deref(), &*loader);
            (store, report)
        })
        .await
        .wrap_err("Resource loading task failed")?;

        self.shared.publish(store);

        if report.loaded > 0 {
            self.arm_watcher();
        } else {
            info!("No resource files loaded, watcher disarmed");
            self.disarm_watcher();
        }

        info!(
            "Load completed in {:?} ({} files)",
            start.elapsed(),
            report.loaded
        );
        Ok(report)
    }

    fn arm_watcher(&self) {
        let mut watcher = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = watcher.arm(&self.root) {
            warn!("File watching unavailable: {:#}", e);
        }
    }

    fn disarm_watcher(&self) {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .disarm();
    }

    /// A reload coordinator wired to this engine's store and loader
    pub fn coordinator<D: Delay + 'static>(&self, delay: D) -> ReloadCoordinator<L, D> {
        ReloadCoordinator::new(
            Arc::clone(&self.shared),
            Arc::clone(&self.loader),
            delay,
            self.root.clone(),
            self.config.extension.clone(),
        )
    }

    /// The store shared with views
    pub fn shared(&self) -> &Arc<SharedStore> {
        &self.shared
    }

    /// Current store contents
    pub fn store(&self) -> Arc<ResourceStore> {
        self.shared.snapshot()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn watcher_state(&self) -> &Arc<WatcherState> {
        &self.watcher_state
    }
}
