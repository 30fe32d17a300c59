//! Export document format versioning.

use semver::Version;

/// Version written into `exportMetadata.formatVersion` by this crate.
pub const FORMAT_VERSION: &str = "2.0.0";

/// Major format version this importer understands.
pub const SUPPORTED_MAJOR: u64 = 2;

/// Version of the package container layout (`manifest.json` + `data.json`).
pub const PACKAGE_VERSION: &str = "1.0.0";

/// Major component of a semantic version string, or `None` if it does not parse.
#[must_use]
pub fn major_of(version: &str) -> Option<u64> {
    Version::parse(version.trim()).ok().map(|v| v.major)
}

/// Whether documents of `version` can be imported by an importer supporting `supported_major`.
#[must_use]
pub fn is_compatible(version: &str, supported_major: u64) -> bool {
    major_of(version) == Some(supported_major)
}
