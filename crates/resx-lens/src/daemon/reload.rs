//! Reloading single resource files after watcher notifications.
//!
//! Editors and build tools often hold a file open for a moment after
//! writing it, so a parse right after the notification can fail. Each
//! trigger runs a small retry state machine:
//!
//! ```text
//! Idle -> Retrying { attempt: 0 } -> ... -> Retrying { attempt: 4 } -> Done
//! ```
//!
//! Attempt `k` waits `k * step` first. After the last failure the store keeps
//! the previous copy of the file, unless the file is gone: some platforms
//! report each half of a rename as a plain change, so a path that still
//! does not exist after every attempt is retracted. The store reads as not ready from the
//! start of the trigger until it is done.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use eyre::WrapErr;
use resx_lens_core::{
    Replaced, ResourceError, ResourceFile, ResourceLoader, SharedStore, has_resource_extension,
};
use tracing::{debug, info, warn};

use super::watcher::WatcherEvent;

/// How often and how patiently a file is re-read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt `k` is `k * step`
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            step: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Delay before the zero-based `attempt`
    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.step * attempt
    }
}

/// Waits between attempts
pub trait Delay: Send + Sync {
    fn delay(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Non-blocking wall-clock delay
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

impl Delay for TokioDelay {
    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl<D: Delay + ?Sized> Delay for Arc<D> {
    fn delay(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        (**self).delay(duration)
    }
}

/// How a trigger ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// Not a tracked resource file
    Ignored,
    /// An existing entry was replaced
    Replaced { attempts: u32 },
    /// A file the store did not know yet was added
    Added { attempts: u32 },
    /// Every attempt failed; the previous content stays
    Retained { attempts: u32 },
    /// The file was retracted from the store
    Removed,
}

impl ReloadOutcome {
    /// Whether the store changed
    pub fn changed_store(&self) -> bool {
        matches!(
            self,
            ReloadOutcome::Replaced { .. } | ReloadOutcome::Added { .. } | ReloadOutcome::Removed
        )
    }
}

/// Retry state for one trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    Idle,
    Retrying { attempt: u32 },
    Done(ReloadOutcome),
}

impl ReloadState {
    /// Leave `Idle` for the first attempt
    pub fn begin(self) -> Self {
        match self {
            ReloadState::Idle => ReloadState::Retrying { attempt: 0 },
            other => other,
        }
    }

    /// Transition after an attempt finished.
    ///
    /// `committed` is `Some` when the parse succeeded and the file was
    /// swapped into the store.
    pub fn after_attempt(self, committed: Option<Replaced>, policy: &RetryPolicy) -> Self {
        let ReloadState::Retrying { attempt } = self else {
            return self;
        };
        let attempts = attempt + 1;
        match committed {
            Some(Replaced::Existing) => ReloadState::Done(ReloadOutcome::Replaced { attempts }),
            Some(Replaced::Added) => ReloadState::Done(ReloadOutcome::Added { attempts }),
            None if attempts < policy.max_attempts => ReloadState::Retrying { attempt: attempts },
            None => ReloadState::Done(ReloadOutcome::Retained { attempts }),
        }
    }
}

/// Applies watcher events to the shared store
pub struct ReloadCoordinator<L, D> {
    shared: Arc<SharedStore>,
    loader: Arc<L>,
    delay: Arc<D>,
    root: PathBuf,
    extension: String,
    policy: RetryPolicy,
}

impl<L, D> Clone for ReloadCoordinator<L, D> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            loader: Arc::clone(&self.loader),
            delay: Arc::clone(&self.delay),
            root: self.root.clone(),
            extension: self.extension.clone(),
            policy: self.policy,
        }
    }
}

impl<L, D> ReloadCoordinator<L, D>
where
    L: ResourceLoader + 'static,
    D: Delay + 'static,
{
    pub fn new(
        shared: Arc<SharedStore>,
        loader: Arc<L>,
        delay: D,
        root: impl Into<PathBuf>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            shared,
            loader,
            delay: Arc::new(delay),
            root: root.into(),
            extension: extension.into(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether a path is a resource file under the root
    pub fn is_tracked(&self, path: &Path) -> bool {
        has_resource_extension(path, &self.extension) && path.starts_with(&self.root)
    }

    /// Dispatch one watcher event
    pub async fn handle(&self, event: WatcherEvent) -> ReloadOutcome {
        match event {
            WatcherEvent::Changed(path) => self.on_file_changed(&path).await,
            WatcherEvent::Renamed { from, to } => self.on_file_renamed(&from, &to).await,
            WatcherEvent::Removed(path) => self.on_file_removed(&path),
        }
    }

    /// A file was created or written
    pub async fn on_file_changed(&self, path: &Path) -> ReloadOutcome {
        if !self.is_tracked(path) {
            return ReloadOutcome::Ignored;
        }
        let _guard = self.shared.begin_update();
        self.reload(path).await
    }

    /// A file was renamed.
    ///
    /// Only the destination decides whether there is anything to load. A
    /// tracked source path is retracted so the old name stops resolving.
    pub async fn on_file_renamed(&self, from: &Path, to: &Path) -> ReloadOutcome {
        let from_tracked = self.is_tracked(from);
        let to_tracked = self.is_tracked(to);
        if !from_tracked && !to_tracked {
            return ReloadOutcome::Ignored;
        }

        let _guard = self.shared.begin_update();
        let retracted = from_tracked && self.retract(from);
        if !to_tracked {
            return if retracted {
                ReloadOutcome::Removed
            } else {
                ReloadOutcome::Ignored
            };
        }
        self.reload(to).await
    }

    /// A file was deleted
    pub fn on_file_removed(&self, path: &Path) -> ReloadOutcome {
        if !self.is_tracked(path) {
            return ReloadOutcome::Ignored;
        }
        let _guard = self.shared.begin_update();
        if self.retract(path) {
            ReloadOutcome::Removed
        } else {
            ReloadOutcome::Ignored
        }
    }

    fn retract(&self, path: &Path) -> bool {
        let removed = self.shared.update(|store| store.remove(path));
        if removed {
            info!("Removed {} from resources", path.display());
        }
        removed
    }

    async fn reload(&self, path: &Path) -> ReloadOutcome {
        let mut state = ReloadState::Idle.begin();
        let mut vanished = false;
        loop {
            match state {
                ReloadState::Retrying { attempt } => {
                    let wait = self.policy.delay_before(attempt);
                    if !wait.is_zero() {
                        self.delay.delay(wait).await;
                    }
                    let committed = match self.load(path).await {
                        Ok(file) => Some(self.shared.update(|store| store.replace(file))),
                        Err(e) => {
                            vanished = e
                                .downcast_ref::<ResourceError>()
                                .is_some_and(ResourceError::is_not_found);
                            debug!(
                                "Reload attempt {}/{} failed: {:#}",
                                attempt + 1,
                                self.policy.max_attempts,
                                e
                            );
                            None
                        }
                    };
                    state = state.after_attempt(committed, &self.policy);
                }
                ReloadState::Done(ReloadOutcome::Retained { attempts }) if vanished => {
                    debug!("{} is gone after {} attempts", path.display(), attempts);
                    return if self.retract(path) {
                        ReloadOutcome::Removed
                    } else {
                        ReloadOutcome::Ignored
                    };
                }
                ReloadState::Done(outcome) => {
                    match outcome {
                        ReloadOutcome::Retained { attempts } => warn!(
                            "Giving up on {} after {} attempts, keeping previous content",
                            path.display(),
                            attempts
                        ),
                        _ => info!("Reloaded {} ({:?})", path.display(), outcome),
                    }
                    return outcome;
                }
                ReloadState::Idle => return ReloadOutcome::Ignored,
            }
        }
    }

    async fn load(&self, path: &Path) -> eyre::Result<ResourceFile> {
        let loader = Arc::clone(&self.loader);
        let owned = path.to_path_buf();
        let file = tokio::task::spawn_blocking(move || loader.load(&owned))
            .await
            .wrap_err("Loader task failed")??;
        Ok(file)
    }
}
