//! Manifest, sidecar, and extraction record types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use acx_core::entities::{AcademySummary, ContentCounts};
use acx_core::enums::{Compression, PackageFormat};

/// Archive entry holding the package manifest.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Archive entry holding the export document.
pub const DATA_FILE: &str = "data.json";
/// Copy of the source archive kept in an extraction directory.
pub const ARCHIVE_COPY_FILE: &str = "package.archive";
/// Extraction record written next to the extracted entries.
pub const EXTRACTION_FILE: &str = "extraction.json";

/// Describes one package. Stored inside the archive (without `archive`) and
/// as the sidecar `<packageId>.json` next to it (with `archive`).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub package_id: String,
    pub package_version: String,
    pub format_version: String,
    pub academy: AcademySummary,
    pub content: ContentCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_by: Option<Value>,
    /// The export document's own checksum (logical content).
    pub data_checksum: String,
    pub files: Vec<FileEntry>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub checksum: String,
}

/// The archive file itself; its checksum covers the raw compressed bytes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveInfo {
    pub path: PathBuf,
    pub format: PackageFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<Compression>,
    pub size: u64,
    pub checksum: String,
}

/// Written to an extraction directory so it can be verified on its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRecord {
    pub package_id: String,
    pub source: PathBuf,
    /// Archive checksum from the sidecar, or of the bytes read when there was none.
    pub expected_checksum: String,
    /// Whether `expected_checksum` came from a sidecar written at build time.
    pub from_sidecar: bool,
    pub extracted_at: DateTime<Utc>,
}

/// One archive in the package store.
#[derive(Debug, Clone, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackageListing {
    pub file_name: String,
    pub package_id: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
    pub manifest: Option<PackageManifest>,
}

/// Options for building a package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageOptions {
    pub format: PackageFormat,
    pub compression: Compression,
}
