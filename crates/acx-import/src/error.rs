//! Import error types.

use std::path::PathBuf;

use acx_core::conflict::Conflict;
use acx_db::error::DatabaseError;
use acx_package::PackageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The package or its document is structurally invalid.
    #[error("Package is invalid: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    /// The package's bytes or document do not match their recorded checksums.
    #[error("Package failed integrity checks: {}", errors.join("; "))]
    ChecksumMismatch { errors: Vec<String> },

    #[error("Package not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Package(PackageError),

    /// Conflicts the import policy cannot resolve. Nothing was written.
    #[error("Import blocked by {} conflict(s): {}", conflicts.len(), summarize(conflicts))]
    ConflictCritical { conflicts: Vec<Conflict> },

    /// The store failed; the transaction was rolled back.
    #[error(transparent)]
    Transaction(#[from] DatabaseError),

    #[error("Import task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<PackageError> for ImportError {
    fn from(err: PackageError) -> Self {
        match err {
            PackageError::NotFound(path) => Self::NotFound(path),
            other => Self::Package(other),
        }
    }
}

fn summarize(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
