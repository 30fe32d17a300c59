use acx_config::AcxConfig;
use acx_package::PackageOptions;
use anyhow::{Context, bail};
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::PackageCommands;
use crate::commands::read_document;
use crate::context::packages;
use crate::output::output;

/// Handle `acx package`. Needs the storage root only, never the store.
pub fn handle(action: &PackageCommands, config: &AcxConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let packages = packages(config);
    match action {
        PackageCommands::Build {
            document,
            compression,
            archive_format,
        } => {
            let doc = read_document(document)?;
            let options = PackageOptions {
                format: archive_format.map_or(config.packaging.format, Into::into),
                compression: compression.map_or(config.packaging.compression, Into::into),
            };
            let manifest = packages
                .create_package(&doc, options)
                .context("failed to build package")?;
            output(&manifest, flags.format)
        }
        PackageCommands::Extract { archive, dest } => {
            let manifest = packages
                .extract_package(archive, dest)
                .with_context(|| format!("failed to extract {}", archive.display()))?;
            output(&manifest, flags.format)
        }
        PackageCommands::Verify { dir } => {
            let report = packages.verify_package(dir)?;
            output(&report, flags.format)?;
            if !report.valid {
                tracing::warn!(
                    dir = %dir.display(),
                    errors = report.errors.len(),
                    "verification failed"
                );
                bail!("{} failed verification", dir.display());
            }
            Ok(())
        }
        PackageCommands::List => output(&packages.list_packages()?, flags.format),
        PackageCommands::Delete { package_id } => {
            let deleted = packages.delete_package(package_id)?;
            output(
                &json!({"packageId": package_id, "deleted": deleted}),
                flags.format,
            )
        }
    }
}
