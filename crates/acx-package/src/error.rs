//! Package error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    /// The archive (or extraction directory) does not exist.
    #[error("Package not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The archive cannot be decompressed or lacks a required entry.
    #[error("Package corrupt: {0}")]
    Corrupt(String),

    /// The export document failed validation; nothing was written.
    #[error("Export document is invalid: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },

    /// A package id that could escape the storage root.
    #[error("Invalid package id '{0}'")]
    InvalidId(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `map_err` adapter attaching `path` to an I/O error.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(std::io::Error) -> PackageError + '_ {
    move |source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    }
}
