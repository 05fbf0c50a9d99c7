//! Typed errors for source loading.
//!
//! Everything operational goes through anyhow; loaders need a typed error
//! because startup treats "persisted file not found" differently from a
//! malformed file.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// File is absent or cannot be opened (first run for the persisted set).
    #[error("parameter file not found or unreadable: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exists but is not a YAML mapping of name -> value.
    #[error("malformed parameter file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// Read failed after the file was opened.
    #[error("read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed under the defaults root.
    #[error("scan defaults under {}", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound { .. })
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::NotFound { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::Io { path, .. } => path,
            LoadError::Walk { root, .. } => root,
        }
    }
}
