//! Common test utilities.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use resx_lens::daemon::Delay;
use resx_lens_core::{ResourceError, ResourceFile, ResourceLoader};

/// Get the path to the test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Copy the fixture project into a temporary directory for isolation.
pub fn create_temp_project() -> tempfile::TempDir {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    copy_dir(&fixtures_dir(), temp.path());
    temp
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).expect("Failed to create directory");
    for entry in std::fs::read_dir(from).expect("Failed to read fixtures") {
        let entry = entry.expect("Failed to read fixture entry");
        let target = to.join(entry.file_name());
        if entry.file_type().expect("Failed to stat fixture").is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), &target).expect("Failed to copy fixture");
        }
    }
}

/// A minimal resource file with the given entries
pub fn resx(entries: &[(&str, &str)]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<root>\n");
    for (name, value) in entries {
        xml.push_str(&format!(
            "  <data name=\"{name}\" xml:space=\"preserve\"><value>{value}</value></data>\n"
        ));
    }
    xml.push_str("</root>\n");
    xml
}

/// In-memory loader whose files can be changed, broken or made to fail
/// a number of times, with a count of every load call.
#[derive(Default)]
pub struct ScriptedLoader {
    files: Mutex<HashMap<PathBuf, String>>,
    failures_left: Mutex<HashMap<PathBuf, u32>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), content.into());
    }

    /// Delete a file so later loads report it as missing
    pub fn remove(&self, path: &Path) {
        self.files.lock().unwrap().remove(path);
    }

    /// Make the next `times` loads of `path` fail as if the file were locked
    pub fn fail(&self, path: impl Into<PathBuf>, times: u32) {
        self.failures_left
            .lock()
            .unwrap()
            .insert(path.into(), times);
    }

    pub fn calls(&self, path: &Path) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_path() == path)
            .count()
    }
}

impl ResourceLoader for ScriptedLoader {
    fn load(&self, path: &Path) -> Result<ResourceFile, ResourceError> {
        self.calls.lock().unwrap().push(path.to_path_buf());

        if let Some(left) = self.failures_left.lock().unwrap().get_mut(path)
            && *left > 0
        {
            *left -= 1;
            return Err(ResourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "file is locked by another process",
                ),
            });
        }

        let content = self
            .files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })?;
        ResourceFile::parse(path, &content)
    }
}

/// Delay that returns immediately and remembers what it was asked to wait
#[derive(Default)]
pub struct RecordingDelay {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

impl Delay for RecordingDelay {
    async fn delay(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

pub fn millis(values: &[u64]) -> Vec<Duration> {
    values.iter().copied().map(Duration::from_millis).collect()
}
