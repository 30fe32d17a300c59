use std::path::PathBuf;

use acx_core::enums::{Compression, PackageFormat};
use clap::{Subcommand, ValueEnum};

/// Package storage operations.
#[derive(Clone, Debug, Subcommand)]
pub enum PackageCommands {
    /// Validate a document and write it as a package.
    Build {
        /// Path to an export document (JSON).
        document: PathBuf,
        /// Compression level preset (defaults to packaging.compression).
        #[arg(long)]
        compression: Option<CompressionArg>,
        /// Archive container (defaults to packaging.format).
        #[arg(long)]
        archive_format: Option<ArchiveFormatArg>,
    },
    /// Extract a package archive into a directory.
    Extract {
        archive: PathBuf,
        dest: PathBuf,
    },
    /// Verify an extraction directory.
    Verify { dir: PathBuf },
    /// List packages in the storage root.
    List,
    /// Delete a package and its sidecar.
    Delete { package_id: String },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompressionArg {
    Low,
    Default,
    High,
}

impl From<CompressionArg> for Compression {
    fn from(value: CompressionArg) -> Self {
        match value {
            CompressionArg::Low => Self::Low,
            CompressionArg::Default => Self::Default,
            CompressionArg::High => Self::High,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ArchiveFormatArg {
    #[value(name = "tar.gz", alias = "tgz")]
    TarGz,
    Zip,
}

impl From<ArchiveFormatArg> for PackageFormat {
    fn from(value: ArchiveFormatArg) -> Self {
        match value {
            ArchiveFormatArg::TarGz => Self::TarGz,
            ArchiveFormatArg::Zip => Self::Zip,
        }
    }
}
