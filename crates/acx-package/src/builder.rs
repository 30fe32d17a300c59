//! Building packages from export documents.

use std::fs;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use acx_core::checksum::sha256_hex;
use acx_core::entities::ExportDocument;
use acx_core::format::{FORMAT_VERSION, PACKAGE_VERSION};
use acx_core::slug::slugify;
use acx_core::validation::validate;

use crate::archive::write_archive;
use crate::error::{PackageError, io_at};
use crate::manifest::{
    ArchiveInfo, DATA_FILE, FileEntry, MANIFEST_FILE, PackageManifest, PackageOptions,
};
use crate::store::PackageStore;

/// `<slug>-<32 hex chars>`; falls back to `academy` when the slug has no
/// usable characters.
#[must_use]
pub fn new_package_id(academy_slug: &str) -> String {
    let base = slugify(academy_slug);
    let base = if base.is_empty() { "academy" } else { &base };
    format!("{base}-{}", Uuid::new_v4().simple())
}

impl PackageStore {
    /// Validate `doc`, then write `<root>/<packageId>.<ext>` in the requested
    /// format and its sidecar.
    ///
    /// The archive holds `manifest.json` and `data.json`. The returned
    /// manifest (also written as the sidecar) additionally records the
    /// archive path and the checksum of the compressed bytes.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::Invalid` with every validation error if the
    /// document is invalid (nothing is written), or `PackageError::Io` if the
    /// files cannot be written.
    pub fn create_package(
        &self,
        doc: &ExportDocument,
        options: PackageOptions,
    ) -> Result<PackageManifest, PackageError> {
        let report = validate(doc);
        if !report.valid {
            return Err(PackageError::Invalid {
                errors: report.errors,
            });
        }

        let academy = doc.academy_summary();
        let package_id = new_package_id(&academy.slug);
        let data = serde_json::to_vec_pretty(doc)?;
        let meta = &doc.export_metadata;

        let mut manifest = PackageManifest {
            package_id: package_id.clone(),
            package_version: PACKAGE_VERSION.to_string(),
            format_version: meta
                .format_version
                .clone()
                .unwrap_or_else(|| FORMAT_VERSION.to_string()),
            academy,
            content: doc.content_counts(),
            exported_at: meta.exported_at,
            exported_by: meta.exported_by.clone(),
            data_checksum: meta.checksum.clone().unwrap_or_default(),
            files: vec![FileEntry {
                name: DATA_FILE.to_string(),
                size: data.len() as u64,
                checksum: sha256_hex(&data),
            }],
            created_at: Utc::now(),
            archive: None,
        };
        let inner_manifest = serde_json::to_vec_pretty(&manifest)?;

        let archive_path = self.archive_path(&package_id, options.format);
        let bytes = write_archive(
            &[
                (MANIFEST_FILE, inner_manifest.as_slice()),
                (DATA_FILE, data.as_slice()),
            ],
            options.format,
            options.compression,
        )
        .map_err(io_at(&archive_path))?;

        fs::create_dir_all(self.root()).map_err(io_at(self.root()))?;
        fs::write(&archive_path, &bytes).map_err(io_at(&archive_path))?;

        manifest.archive = Some(ArchiveInfo {
            path: archive_path,
            format: options.format,
            compression: Some(options.compression),
            size: bytes.len() as u64,
            checksum: sha256_hex(&bytes),
        });
        let sidecar_path = self.sidecar_path(&package_id);
        fs::write(&sidecar_path, serde_json::to_vec_pretty(&manifest)?)
            .map_err(io_at(&sidecar_path))?;

        info!(
            package_id = %manifest.package_id,
            academy = %manifest.academy.slug,
            format = %options.format,
            items = manifest.content.total(),
            size = bytes.len(),
            "package built"
        );
        Ok(manifest)
    }
}
