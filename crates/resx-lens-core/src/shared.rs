//! Process-wide resource state shared by every open view.
//!
//! [`SharedStore`] is constructed once by the host and handed to each view's
//! [`AnnotationSynchronizer`](crate::AnnotationSynchronizer). Readers take a
//! cheap [`Arc`] snapshot. Writers go through [`SharedStore::update`], which
//! clones the current store, applies the change and swaps the result in while
//! holding the write lock, so writes are serialized and a reader always sees
//! a complete store.
//!
//! Readiness is tracked separately: every load or reload holds an
//! [`UpdateGuard`] for its whole duration (including retry waits) and scans
//! are skipped while any guard is alive.

use crate::store::ResourceStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub struct SharedStore {
    current: RwLock<Arc<ResourceStore>>,
    pending: Arc<AtomicUsize>,
}

impl SharedStore {
    pub fn new(store: ResourceStore) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(Arc::new(store)),
            pending: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// The current store. Later updates do not affect the returned value.
    pub fn snapshot(&self) -> Arc<ResourceStore> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether no load or reload is in flight
    pub fn is_ready(&self) -> bool {
        self.pending.load(Ordering::SeqCst) == 0
    }

    /// Mark an update as in flight until the guard is dropped
    pub fn begin_update(&self) -> UpdateGuard {
        let previous = self.pending.fetch_add(1, Ordering::SeqCst);
        debug!("Resource update started ({} in flight)", previous + 1);
        UpdateGuard {
            pending: Arc::clone(&self.pending),
        }
    }

    /// Apply a change to a copy of the store and publish it
    pub fn update<R>(&self, f: impl FnOnce(&mut ResourceStore) -> R) -> R {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = ResourceStore::clone(&current);
        let result = f(&mut next);
        *current = Arc::new(next);
        result
    }

    /// Replace the store wholesale
    pub fn publish(&self, store: ResourceStore) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(store);
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(ResourceStore::default())),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("files", &self.snapshot().len())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Keeps the store "not ready" while alive
#[must_use = "readiness is restored as soon as the guard is dropped"]
#[derive(Debug)]
pub struct UpdateGuard {
    pending: Arc<AtomicUsize>,
}

impl Drop for UpdateGuard {
    fn drop(&mut self) {
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceFile;

    #[test]
    fn test_readiness_follows_guards() {
        let shared = SharedStore::new(ResourceStore::default());
        assert!(shared.is_ready());

        let first = shared.begin_update();
        let second = shared.begin_update();
        assert!(!shared.is_ready());

        drop(first);
        assert!(!shared.is_ready());
        drop(second);
        assert!(shared.is_ready());
    }

    #[test]
    fn test_snapshot_is_isolated_from_updates() {
        let shared = SharedStore::new(ResourceStore::default());
        let before = shared.snapshot();

        shared.update(|store| {
            store.replace(ResourceFile::from_entries("/p/A.resx", [("K", "v")]).unwrap());
        });

        assert!(before.is_empty());
        assert_eq!(shared.snapshot().len(), 1);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let shared = SharedStore::new(ResourceStore::default());
        let removed = shared.update(|store| store.remove(std::path::Path::new("/p/none.resx")));
        assert!(!removed);
    }
}
