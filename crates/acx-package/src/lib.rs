//! # acx-package
//!
//! Versioned, checksummed packages of academy export documents.
//!
//! A package is `<root>/<packageId>.tar.gz` (or `.zip`) holding
//! `manifest.json` and `data.json`, plus a sidecar `<root>/<packageId>.json` carrying the same
//! manifest with the archive's own size and SHA-256. The archive checksum
//! covers the compressed bytes; the manifest's `dataChecksum` is the export
//! document's logical checksum.
//!
//! [`PackageStore`] builds, extracts, verifies, lists, and deletes packages.

mod archive;
mod builder;
pub mod error;
pub mod manifest;
mod reader;
mod store;

#[cfg(test)]
mod test_support;

pub use archive::MAX_ENTRY_BYTES;
pub use builder::new_package_id;
pub use error::PackageError;
pub use manifest::{
    ArchiveInfo, ExtractionRecord, FileEntry, PackageListing, PackageManifest, PackageOptions,
};
pub use store::PackageStore;
