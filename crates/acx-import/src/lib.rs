//! # acx-import
//!
//! Preview and import of academy packages.
//!
//! Both flows extract the archive into a temporary directory under the
//! configured temp root, verify it, and read the document into memory; the
//! directory is gone before any store access. Preview only reads. Import
//! checks for unresolvable conflicts up front, then commits the whole tree
//! in one unit of work on a spawned task, so a caller that stops polling
//! cannot interrupt it halfway.

mod commit;
pub mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use acx_core::conflict::detect_conflicts;
use acx_core::entities::ExportDocument;
use acx_core::responses::{ImportOptions, ImportPreview, ImportResult};
use acx_db::service::AcademyStore;
use acx_package::{PackageError, PackageManifest, PackageStore};
use tracing::{info, warn};

pub use error::ImportError;

/// A verified package, read into memory.
struct LoadedPackage {
    manifest: PackageManifest,
    document: ExportDocument,
}

pub struct ImportOrchestrator {
    store: Arc<AcademyStore>,
    packages: PackageStore,
    temp_root: PathBuf,
}

impl ImportOrchestrator {
    pub fn new(
        store: Arc<AcademyStore>,
        packages: PackageStore,
        temp_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            packages,
            temp_root: temp_root.into(),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<AcademyStore> {
        &self.store
    }

    #[must_use]
    pub const fn packages(&self) -> &PackageStore {
        &self.packages
    }

    /// Conflicts and counts for importing `archive` with default options.
    ///
    /// # Errors
    ///
    /// See [`Self::preview_with_options`].
    pub async fn preview_import(&self, archive: &Path) -> Result<ImportPreview, ImportError> {
        self.preview_with_options(archive, &ImportOptions::default())
            .await
    }

    /// Conflicts and counts for importing `archive` with `options`. Never writes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Package`, `Validation`, or `ChecksumMismatch` if
    /// the archive cannot be loaded, or `Transaction` if the store cannot be read.
    pub async fn preview_with_options(
        &self,
        archive: &Path,
        options: &ImportOptions,
    ) -> Result<ImportPreview, ImportError> {
        let loaded = self.load(archive).await?;
        let doc = &loaded.document;
        let ctx = self.store.target_context(doc, options).await?;
        let report = detect_conflicts(doc, &ctx);
        let can_import = report.can_import();

        info!(
            package_id = %loaded.manifest.package_id,
            critical = report.critical.len(),
            warnings = report.warnings.len(),
            can_import,
            "import preview computed"
        );
        Ok(ImportPreview {
            package_id: loaded.manifest.package_id,
            format_version: doc.export_metadata.format_version.clone(),
            academy: doc.academy_summary(),
            conflicts: report.into_all(),
            stats: doc.content_counts(),
            can_import,
        })
    }

    /// Import `archive` in a single transaction.
    ///
    /// # Errors
    ///
    /// - `NotFound`, `Package`, `Validation`, `ChecksumMismatch` if the
    ///   archive cannot be loaded.
    /// - `ConflictCritical` if a critical conflict has no resolution under
    ///   `options`, found before the transaction or by the re-check inside it.
    /// - `Transaction` with the store's error if any write fails.
    ///
    /// Nothing is written on any error.
    pub async fn import_academy(
        &self,
        archive: &Path,
        options: ImportOptions,
    ) -> Result<ImportResult, ImportError> {
        let loaded = self.load(archive).await?;
        let doc = loaded.document;
        info!(
            package_id = %loaded.manifest.package_id,
            academy = %loaded.manifest.academy.slug,
            "import started"
        );

        let ctx = self.store.target_context(&doc, &options).await?;
        let unresolved = detect_conflicts(&doc, &ctx).unresolved_critical();
        if !unresolved.is_empty() {
            warn!(
                package_id = %loaded.manifest.package_id,
                conflicts = unresolved.len(),
                "import blocked by critical conflicts"
            );
            return Err(ImportError::ConflictCritical {
                conflicts: unresolved,
            });
        }

        let store = Arc::clone(&self.store);
        tokio::spawn(async move { commit::run(&store, &doc, &options).await }).await?
    }

    /// Extract and verify `archive` on the blocking pool.
    async fn load(&self, archive: &Path) -> Result<LoadedPackage, ImportError> {
        let packages = self.packages.clone();
        let temp_root = self.temp_root.clone();
        let archive = archive.to_path_buf();
        tokio::task::spawn_blocking(move || load_blocking(&packages, &temp_root, &archive)).await?
    }
}

fn load_blocking(
    packages: &PackageStore,
    temp_root: &Path,
    archive: &Path,
) -> Result<LoadedPackage, ImportError> {
    if !archive.is_file() {
        return Err(ImportError::NotFound(archive.to_path_buf()));
    }
    let io_error = |source| {
        ImportError::Package(PackageError::Io {
            path: temp_root.to_path_buf(),
            source,
        })
    };
    std::fs::create_dir_all(temp_root).map_err(io_error)?;
    // Removed when dropped, on every return path.
    let workdir = tempfile::Builder::new()
        .prefix("acx-import-")
        .tempdir_in(temp_root)
        .map_err(io_error)?;

    let manifest = packages.extract_package(archive, workdir.path())?;
    let report = packages.verify_package(workdir.path())?;
    if !report.valid {
        return Err(if report.only_checksum_mismatches() {
            ImportError::ChecksumMismatch {
                errors: report.errors,
            }
        } else {
            ImportError::Validation {
                errors: report.errors,
            }
        });
    }
    let document = packages.read_document(workdir.path())?;
    Ok(LoadedPackage { manifest, document })
}
