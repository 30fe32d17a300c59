use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::{ImportCommands, PackageCommands};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Build, extract, verify, list, and delete packages.
    Package {
        #[command(subcommand)]
        action: PackageCommands,
    },
    /// Preview or run an import.
    Import {
        #[command(subcommand)]
        action: ImportCommands,
    },
    /// Export a stored academy as a document or package.
    Export(ExportArgs),
    /// Validate an export document file.
    Validate(ValidateArgs),
    /// Print JSON schemas of the exchanged documents.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ExportArgs {
    /// Id of the academy to export.
    pub academy_id: String,
    /// Write the document to this file instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Build a package in the storage root instead of emitting the document.
    #[arg(long)]
    pub package: bool,
    /// Exporter identity as a JSON value, e.g. '{"userEmail":"ops@example.com"}'.
    #[arg(long)]
    pub exported_by: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ValidateArgs {
    /// Path to an export document (JSON).
    pub document: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Only print this schema (e.g. export-document, manifest).
    #[arg(long = "type")]
    pub type_name: Option<String>,
}
