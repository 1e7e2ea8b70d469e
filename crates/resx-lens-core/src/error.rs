//! Error types surfaced at the library boundary

use std::path::PathBuf;

/// Failure to turn a file on disk into a [`ResourceFile`](crate::ResourceFile)
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The file could not be read (missing, locked by another writer, ...)
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not well-formed XML
    #[error("failed to parse {path}: {source}")]
    Xml {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// The path has no usable file name
    #[error("not a resource file name: {0}")]
    InvalidName(PathBuf),
}

impl ResourceError {
    /// Path of the file that failed
    pub fn path(&self) -> &std::path::Path {
        match self {
            ResourceError::Io { path, .. } => path,
            ResourceError::Xml { path, .. } => path,
            ResourceError::InvalidName(path) => path,
        }
    }

    /// Whether the file no longer exists
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ResourceError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Failure to compute on-screen geometry for part of a line
///
/// Raised by [`LineGeometry`](crate::LineGeometry) implementations when the
/// host view no longer matches the text being scanned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The requested character range lies outside the laid-out line
    #[error("character range {start}..{end} is outside the line (length {len})")]
    OutOfRange { start: usize, end: usize, len: usize },

    /// The line is no longer part of the view
    #[error("line {0} is not laid out")]
    LineNotLaidOut(usize),
}
