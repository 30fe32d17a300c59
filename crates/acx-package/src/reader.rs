//! Extracting and verifying packages.

use std::fs;
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info, warn};

use acx_core::checksum::sha256_hex;
use acx_core::entities::ExportDocument;
use acx_core::validation::{CHECKSUM_MISMATCH, ValidationReport, validate};

use crate::archive::{MAX_ENTRY_BYTES, detect_format, read_entries};
use crate::error::{PackageError, io_at};
use crate::manifest::{
    ARCHIVE_COPY_FILE, ArchiveInfo, DATA_FILE, EXTRACTION_FILE, ExtractionRecord, MANIFEST_FILE,
    PackageManifest,
};
use crate::store::{PackageStore, read_sidecar, sidecar_for};

const REQUIRED_FILES: [&str; 4] = [MANIFEST_FILE, DATA_FILE, ARCHIVE_COPY_FILE, EXTRACTION_FILE];

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), PackageError> {
    fs::write(path, bytes).map_err(io_at(path))
}

/// A file entry name that stays inside the extraction directory.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != ".."
}

impl PackageStore {
    /// Decompress `archive` into `dest` and return its manifest.
    ///
    /// `dest` receives `manifest.json`, `data.json`, a copy of the archive,
    /// and an extraction record holding the expected archive checksum, so
    /// [`verify_package`](Self::verify_package) needs nothing else. When the
    /// archive has a sidecar, the extracted package id must match it and
    /// the sidecar's checksum becomes the expected one.
    ///
    /// # Errors
    ///
    /// - `PackageError::NotFound` if `archive` does not exist.
    /// - `PackageError::Corrupt` if it cannot be decompressed, lacks
    ///   `manifest.json` or `data.json`, has an entry larger than
    ///   [`MAX_ENTRY_BYTES`] once decompressed, has an unparseable manifest,
    ///   or disagrees with its sidecar.
    pub fn extract_package(
        &self,
        archive: &Path,
        dest: &Path,
    ) -> Result<PackageManifest, PackageError> {
        if !archive.is_file() {
            return Err(PackageError::NotFound(archive.to_path_buf()));
        }
        let bytes = fs::read(archive).map_err(io_at(archive))?;
        let format = detect_format(archive, &bytes);
        let entries = read_entries(&bytes, format, MAX_ENTRY_BYTES)?;
        let mut manifest: PackageManifest = serde_json::from_slice(&entries.manifest)
            .map_err(|e| PackageError::Corrupt(format!("{MANIFEST_FILE}: {e}")))?;

        let sidecar = sidecar_for(archive).and_then(|path| read_sidecar(&path));
        if let Some(recorded) = &sidecar
            && recorded.package_id != manifest.package_id
        {
            return Err(PackageError::Corrupt(format!(
                "package id '{}' does not match recorded '{}'",
                manifest.package_id, recorded.package_id
            )));
        }

        let actual = ArchiveInfo {
            path: archive.to_path_buf(),
            format,
            compression: None,
            size: bytes.len() as u64,
            checksum: sha256_hex(&bytes),
        };
        let recorded_archive = sidecar.and_then(|s| s.archive);
        let from_sidecar = recorded_archive.is_some();
        let expected = recorded_archive.unwrap_or(actual);

        fs::create_dir_all(dest).map_err(io_at(dest))?;
        write_file(&dest.join(MANIFEST_FILE), &entries.manifest)?;
        write_file(&dest.join(DATA_FILE), &entries.data)?;
        write_file(&dest.join(ARCHIVE_COPY_FILE), &bytes)?;
        let record = ExtractionRecord {
            package_id: manifest.package_id.clone(),
            source: archive.to_path_buf(),
            expected_checksum: expected.checksum.clone(),
            from_sidecar,
            extracted_at: Utc::now(),
        };
        write_file(
            &dest.join(EXTRACTION_FILE),
            &serde_json::to_vec_pretty(&record)?,
        )?;

        info!(
            package_id = %manifest.package_id,
            dest = %dest.display(),
            %format,
            from_sidecar,
            "package extracted"
        );
        manifest.archive = Some(expected);
        Ok(manifest)
    }

    /// Re-check an extraction directory: required files, the archive
    /// checksum, per-file checksums, the manifest's data checksum, and the
    /// document itself. Every failure is reported in the returned report.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::NotFound` if `dest` is not a directory.
    pub fn verify_package(&self, dest: &Path) -> Result<ValidationReport, PackageError> {
        if !dest.is_dir() {
            return Err(PackageError::NotFound(dest.to_path_buf()));
        }

        let mut errors: Vec<String> = REQUIRED_FILES
            .iter()
            .filter(|name| !dest.join(name).is_file())
            .map(|name| format!("Missing required file: {name}"))
            .collect();
        if !errors.is_empty() {
            return Ok(ValidationReport::from_errors(errors));
        }

        let record: Option<ExtractionRecord> = read_json(dest, EXTRACTION_FILE, &mut errors);
        let manifest: Option<PackageManifest> = read_json(dest, MANIFEST_FILE, &mut errors);
        let doc: Option<ExportDocument> = read_json(dest, DATA_FILE, &mut errors);

        if let Some(record) = &record {
            let archive = dest.join(ARCHIVE_COPY_FILE);
            let bytes = fs::read(&archive).map_err(io_at(&archive))?;
            if sha256_hex(&bytes) != record.expected_checksum {
                errors.push(format!("{CHECKSUM_MISMATCH}: archive"));
            }
        }

        if let Some(manifest) = &manifest {
            if let Some(record) = &record
                && record.package_id != manifest.package_id
            {
                errors.push(format!(
                    "Package id mismatch: manifest has '{}', extraction has '{}'",
                    manifest.package_id, record.package_id
                ));
            }
            for file in &manifest.files {
                if !is_plain_name(&file.name) {
                    errors.push(format!("Invalid file entry: {}", file.name));
                    continue;
                }
                let path = dest.join(&file.name);
                let Ok(bytes) = fs::read(&path) else {
                    errors.push(format!("Missing listed file: {}", file.name));
                    continue;
                };
                if bytes.len() as u64 != file.size {
                    errors.push(format!(
                        "{CHECKSUM_MISMATCH}: {} (size {} != {})",
                        file.name,
                        bytes.len(),
                        file.size
                    ));
                } else if sha256_hex(&bytes) != file.checksum {
                    errors.push(format!("{CHECKSUM_MISMATCH}: {}", file.name));
                }
            }
            if let Some(doc) = &doc
                && doc.export_metadata.checksum.as_deref() != Some(manifest.data_checksum.as_str())
            {
                errors.push(format!("{CHECKSUM_MISMATCH}: manifest dataChecksum"));
            }
        }

        if let Some(doc) = &doc {
            errors.extend(validate(doc).errors);
        }

        let report = ValidationReport::from_errors(errors);
        if report.valid {
            debug!(dest = %dest.display(), "package verified");
        } else {
            warn!(dest = %dest.display(), errors = report.errors.len(), "package failed verification");
        }
        Ok(report)
    }

    /// Parse the export document from an extraction directory.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::NotFound` if `data.json` is missing or
    /// `PackageError::Corrupt` if it is not a well-formed document.
    pub fn read_document(&self, dest: &Path) -> Result<ExportDocument, PackageError> {
        let path = dest.join(DATA_FILE);
        if !path.is_file() {
            return Err(PackageError::NotFound(path));
        }
        let text = fs::read_to_string(&path).map_err(io_at(&path))?;
        ExportDocument::from_json(&text).map_err(|e| PackageError::Corrupt(format!("{DATA_FILE}: {e}")))
    }
}

fn read_json<T: serde::de::DeserializeOwned>(
    dest: &Path,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<T> {
    let parsed = fs::read(dest.join(name))
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()));
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            errors.push(format!("Unreadable {name}: {e}"));
            None
        }
    }
}
