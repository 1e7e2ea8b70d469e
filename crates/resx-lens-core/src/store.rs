//! The resource dictionary store
//!
//! Holds every loaded [`ResourceFile`] together with the search prefixes the
//! scanner anchors on. A store value is treated as an immutable snapshot once
//! published through [`SharedStore`](crate::SharedStore); writers clone it,
//! apply their change and swap the result in.

use crate::error::ResourceError;
use crate::resource::ResourceFile;
use crate::sources::ResourceLoader;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of [`ResourceStore::load_all`]
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Number of files that parsed and are now in the store
    pub loaded: usize,
    /// Files that were skipped, with the reason
    pub failures: Vec<ResourceError>,
}

/// What [`ResourceStore::replace`] did with the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replaced {
    /// An entry with the same path existed and was swapped out
    Existing,
    /// The path was new and the file was appended
    Added,
}

/// Loaded resource files plus derived lookup state
#[derive(Debug, Clone, Default)]
pub struct ResourceStore {
    root: Option<PathBuf>,
    preferred_culture: Option<String>,
    files: Vec<Arc<ResourceFile>>,
    prefixes: Vec<String>,
    /// Lowercased stem -> indexes into `files`, in load order
    by_stem: HashMap<String, Vec<usize>>,
}

impl ResourceStore {
    /// An empty store
    pub fn new(preferred_culture: Option<String>) -> Self {
        Self {
            preferred_culture: normalize_culture(preferred_culture),
            ..Self::default()
        }
    }

    /// Build a store from already parsed files (no I/O)
    pub fn from_files(
        files: impl IntoIterator<Item = ResourceFile>,
        preferred_culture: Option<String>,
    ) -> Self {
        let mut store = Self::new(preferred_culture);
        store.files = files.into_iter().map(Arc::new).collect();
        store.reindex();
        store
    }

    /// Replace the whole content of the store with the given files.
    ///
    /// Files that fail to load are skipped and reported; the rest still
    /// load. A store with zero usable files is valid, just empty.
    pub fn load_all<L: ResourceLoader + ?Sized>(
        &mut self,
        paths: &[PathBuf],
        root: &Path,
        preferred_culture: Option<&str>,
        loader: &L,
    ) -> LoadReport {
        self.clear();
        self.root = Some(root.to_path_buf());
        self.preferred_culture = normalize_culture(preferred_culture.map(str::to_string));

        #[cfg(feature = "parallel")]
        let results: Vec<_> = {
            use rayon::prelude::*;
            paths.par_iter().map(|path| loader.load(path)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<_> = paths.iter().map(|path| loader.load(path)).collect();

        let mut report = LoadReport::default();
        for result in results {
            match result {
                Ok(file) => {
                    debug!(
                        "Loaded {} ({} entries)",
                        file.path().display(),
                        file.len()
                    );
                    self.files.push(Arc::new(file));
                }
                Err(e) => {
                    warn!("Skipping resource file: {e}");
                    report.failures.push(e);
                }
            }
        }
        report.loaded = self.files.len();
        self.reindex();

        info!(
            "Loaded {} resource files ({} failed, {} prefixes)",
            report.loaded,
            report.failures.len(),
            self.prefixes.len()
        );
        report
    }

    /// Swap in a freshly parsed file, keyed by path.
    ///
    /// The previous entry is replaced wholesale, never patched.
    pub fn replace(&mut self, file: ResourceFile) -> Replaced {
        let file = Arc::new(file);
        let replaced = match self.files.iter().position(|f| f.path() == file.path()) {
            Some(idx) => {
                self.files[idx] = file;
                Replaced::Existing
            }
            None => {
                self.files.push(file);
                Replaced::Added
            }
        };
        self.reindex();
        replaced
    }

    /// Drop the file with this path. Returns whether it was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.path() != path);
        let removed = self.files.len() != before;
        if removed {
            self.reindex();
        }
        removed
    }

    /// Forget every file and derived prefix
    pub fn clear(&mut self) {
        self.files.clear();
        self.prefixes.clear();
        self.by_stem.clear();
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn preferred_culture(&self) -> Option<&str> {
        self.preferred_culture.as_deref()
    }

    /// Loaded files in load order
    pub fn files(&self) -> impl Iterator<Item = &ResourceFile> {
        self.files.iter().map(|f| f.as_ref())
    }

    pub fn file(&self, path: &Path) -> Option<&ResourceFile> {
        self.files().find(|f| f.path() == path)
    }

    /// Whether a path is one of the loaded files
    pub fn contains(&self, path: &Path) -> bool {
        self.file(path).is_some()
    }

    /// Deduplicated `"<BaseName>."` anchors, in first-seen order
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files whose stem equals `stem` ignoring ASCII case, in load order
    pub(crate) fn files_with_stem_ignore_case<'a>(
        &'a self,
        stem: &str,
    ) -> impl Iterator<Item = &'a ResourceFile> + use<'a> {
        self.by_stem
            .get(&stem.to_ascii_lowercase())
            .into_iter()
            .flatten()
            .map(|&idx| self.files[idx].as_ref())
    }

    fn reindex(&mut self) {
        self.prefixes.clear();
        self.by_stem.clear();

        let culture = self.preferred_culture.as_deref();
        for (idx, file) in self.files.iter().enumerate() {
            let prefix = search_prefix(file.stem(), culture);
            if !self.prefixes.contains(&prefix) {
                self.prefixes.push(prefix);
            }
            self.by_stem
                .entry(file.stem().to_ascii_lowercase())
                .or_default()
                .push(idx);
        }
    }
}

/// Derive the scan anchor for a file stem.
///
/// A stem ending in `.<preferred culture>` (any case) has that suffix
/// removed first, so `Strings.fr` and `Strings` share `"Strings."`.
///
/// ```
/// use resx_lens_core::search_prefix;
///
/// assert_eq!(search_prefix("Strings.fr", Some("fr")), "Strings.");
/// assert_eq!(search_prefix("Strings.fr", None), "Strings.fr.");
/// assert_eq!(search_prefix("Strings", Some("fr")), "Strings.");
/// ```
pub fn search_prefix(stem: &str, preferred_culture: Option<&str>) -> String {
    let logical = preferred_culture
        .and_then(|culture| strip_suffix_ignore_case(stem, &format!(".{culture}")))
        .unwrap_or(stem);
    format!("{logical}.")
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if split == 0 {
        return None;
    }
    let tail = s.get(split..)?;
    tail.eq_ignore_ascii_case(suffix).then(|| &s[..split])
}

fn normalize_culture(culture: Option<String>) -> Option<String> {
    culture
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}
