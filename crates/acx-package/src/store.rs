//! The package storage root: archive paths, listing, and deletion.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use acx_core::enums::PackageFormat;

use crate::error::{PackageError, io_at};
use crate::manifest::{PackageListing, PackageManifest};

/// Directory holding `<packageId>.tar.gz` and `<packageId>.zip` archives and their
/// `<packageId>.json` sidecar manifests.
///
/// All I/O is synchronous; async callers run it on the blocking pool.
#[derive(Debug, Clone)]
pub struct PackageStore {
    root: PathBuf,
}

impl PackageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn archive_path(&self, package_id: &str, format: PackageFormat) -> PathBuf {
        self.root.join(format!("{package_id}.{}", format.extension()))
    }

    #[must_use]
    pub fn sidecar_path(&self, package_id: &str) -> PathBuf {
        self.root.join(format!("{package_id}.json"))
    }

    /// Archives in the storage root, sorted by file name. A missing root is
    /// an empty store.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::Io` if the root exists but cannot be read.
    pub fn list_packages(&self) -> Result<Vec<PackageListing>, PackageError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_at(&self.root)(e)),
        };

        let mut listings = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_at(&self.root))?;
            let path = entry.path();
            let Some(package_id) = package_id_of(&path) else {
                continue;
            };
            let metadata = entry.metadata().map_err(io_at(&path))?;
            if !metadata.is_file() {
                continue;
            }
            let manifest = read_sidecar(&self.sidecar_path(&package_id));
            listings.push(PackageListing {
                file_name: entry.file_name().to_string_lossy().into_owned(),
                package_id,
                size: metadata.len(),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
                manifest,
            });
        }
        listings.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(listings)
    }

    /// Remove a package's archive and sidecar. Returns whether anything was
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns `PackageError::InvalidId` for ids that could name a path
    /// outside the root, or `PackageError::Io` if a removal fails.
    pub fn delete_package(&self, package_id: &str) -> Result<bool, PackageError> {
        if !is_valid_package_id(package_id) {
            return Err(PackageError::InvalidId(package_id.to_string()));
        }
        let mut removed = false;
        let archives = PackageFormat::ALL.map(|format| self.archive_path(package_id, format));
        for path in archives.into_iter().chain([self.sidecar_path(package_id)]) {
            match fs::remove_file(&path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(io_at(&path)(e)),
            }
        }
        if removed {
            info!(package_id, "package deleted");
        } else {
            debug!(package_id, "no package to delete");
        }
        Ok(removed)
    }
}

/// Ids name a single file in the root: no separators, no parent hops.
pub(crate) fn is_valid_package_id(package_id: &str) -> bool {
    !package_id.trim().is_empty()
        && !package_id.contains(['/', '\\'])
        && !package_id.contains("..")
}

/// `<id>` for a path named `<id>.tar.gz` or `<id>.zip`.
pub(crate) fn package_id_of(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    PackageFormat::split_file_name(name)
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Sidecar next to an archive path, whether or not it exists.
pub(crate) fn sidecar_for(archive: &Path) -> Option<PathBuf> {
    let package_id = package_id_of(archive)?;
    Some(archive.with_file_name(format!("{package_id}.json")))
}

/// Parsed sidecar, or `None` if it is absent or unreadable.
pub(crate) fn read_sidecar(path: &Path) -> Option<PackageManifest> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "ignoring unreadable sidecar");
            None
        }
    }
}
