//! Where resource files come from: discovery on disk and loading

use crate::error::ResourceError;
use crate::resource::ResourceFile;
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extension of the resource files tracked by default
pub const RESOURCE_EXTENSION: &str = "resx";

/// Check if a path carries the given resource extension (ASCII case-insensitive)
pub fn has_resource_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Turns a path into a parsed [`ResourceFile`]
///
/// The store and the reload path both go through a loader, which lets tests
/// substitute files that are missing, locked or malformed.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<ResourceFile, ResourceError>;
}

/// Loads resource files from the file system
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl ResourceLoader for FsLoader {
    fn load(&self, path: &Path) -> Result<ResourceFile, ResourceError> {
        ResourceFile::read(path)
    }
}

/// In-memory resource content (useful for testing)
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader(HashMap<PathBuf, String>);

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content
    pub fn add(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.0.insert(path.into(), content.into());
        self
    }

    /// Paths known to this loader, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.0.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, path: &Path) -> Result<ResourceFile, ResourceError> {
        let content = self.0.get(path).ok_or_else(|| ResourceError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })?;
        ResourceFile::parse(path, content)
    }
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for std::sync::Arc<L> {
    fn load(&self, path: &Path) -> Result<ResourceFile, ResourceError> {
        (**self).load(path)
    }
}

/// Gitignore-aware discovery of resource files under a root
#[cfg(feature = "walk")]
pub struct WalkResources {
    root: PathBuf,
    extension: String,
    exclude: Vec<String>,
}

#[cfg(feature = "walk")]
impl WalkResources {
    /// Create a walker for the given root directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: RESOURCE_EXTENSION.to_string(),
            exclude: Vec::new(),
        }
    }

    /// Track a different extension than `resx`
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Add exclude patterns (e.g., `["bin/**", "obj/**"]`)
    pub fn exclude(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Walk the root and return every matching file, sorted by path
    pub fn discover(self) -> eyre::Result<Vec<PathBuf>> {
        use eyre::WrapErr;
        use globset::{Glob, GlobSetBuilder};
        use ignore::WalkBuilder;

        let mut builder = GlobSetBuilder::new();
        for pattern in &self.exclude {
            let glob = Glob::new(&pattern.replace('\\', "/"))
                .wrap_err_with(|| format!("Invalid exclude pattern: {pattern}"))?;
            builder.add(glob);
        }
        let excludes = builder.build().wrap_err("Failed to build exclude patterns")?;

        let walker = WalkBuilder::new(&self.root)
            .follow_links(true)
            .hidden(false) // Don't skip hidden files (but .git is in .gitignore)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            if !has_resource_extension(path, &self.extension) {
                continue;
            }
            let relative = path.strip_prefix(&self.root).unwrap_or(path);
            let relative = relative.to_string_lossy().replace('\\', "/");
            if excludes.is_match(&relative) {
                continue;
            }
            paths.push(entry.into_path());
        }

        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_resource_extension() {
        assert!(has_resource_extension(Path::new("a/Strings.resx"), "resx"));
        assert!(has_resource_extension(Path::new("a/Strings.RESX"), "resx"));
        assert!(!has_resource_extension(Path::new("a/Strings.resx~"), "resx"));
        assert!(!has_resource_extension(Path::new("a/Strings"), "resx"));
    }

    #[test]
    fn test_memory_loader_missing_path() {
        let loader = MemoryLoader::new().add("/p/A.resx", "<root/>");
        assert!(loader.load(Path::new("/p/A.resx")).is_ok());
        let err = loader.load(Path::new("/p/B.resx")).unwrap_err();
        assert!(matches!(err, ResourceError::Io { .. }));
    }

    #[cfg(feature = "walk")]
    #[test]
    fn test_walk_finds_resource_files() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("App/Properties")).unwrap();
        std::fs::create_dir_all(root.join("App/obj")).unwrap();
        std::fs::write(root.join("App/Properties/Resources.resx"), "<root/>").unwrap();
        std::fs::write(root.join("App/Properties/Resources.fr.resx"), "<root/>").unwrap();
        std::fs::write(root.join("App/obj/Generated.resx"), "<root/>").unwrap();
        std::fs::write(root.join("App/Program.cs"), "class P {}").unwrap();

        let found = WalkResources::new(root)
            .exclude(["**/obj/**"])
            .discover()
            .unwrap();

        assert_eq!(
            found,
            vec![
                root.join("App/Properties/Resources.fr.resx"),
                root.join("App/Properties/Resources.resx"),
            ]
        );
    }
}
