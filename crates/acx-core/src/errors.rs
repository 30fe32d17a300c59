//! Cross-cutting error types for acx.
//!
//! Domain-specific errors (`DatabaseError`, `PackageError`, `ImportError`) are
//! defined in their respective crates. The CLI converts all of them into
//! `anyhow::Error` at the edge.

use thiserror::Error;

/// Errors that can be raised by any acx crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document or record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
