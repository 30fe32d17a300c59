pub mod dispatch;
pub mod export;
pub mod import;
pub mod package;
pub mod schema;
pub mod validate;

use std::path::Path;

use acx_core::entities::ExportDocument;
use anyhow::Context;

/// Read and parse an export document file.
pub fn read_document(path: &Path) -> anyhow::Result<ExportDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ExportDocument::from_json(&text)
        .with_context(|| format!("{} is not an export document", path.display()))
}
