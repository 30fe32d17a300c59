use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Import operations.
#[derive(Clone, Debug, Subcommand)]
pub enum ImportCommands {
    /// Show conflicts and counts without writing.
    Preview {
        archive: PathBuf,
        /// Preview against an existing academy.
        #[arg(long)]
        target: Option<String>,
    },
    /// Import a package in one transaction.
    Run(ImportRunArgs),
}

#[derive(Clone, Debug, Args)]
pub struct ImportRunArgs {
    pub archive: PathBuf,
    /// Update colliding items in place.
    #[arg(long)]
    pub overwrite: bool,
    /// Fail instead of suffixing colliding slugs.
    #[arg(long)]
    pub no_rename: bool,
    /// Skip colliding items and their children.
    #[arg(long)]
    pub skip_conflicts: bool,
    /// Import into this existing academy.
    #[arg(long)]
    pub target: Option<String>,
}
