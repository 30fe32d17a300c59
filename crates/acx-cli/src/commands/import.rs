use acx_core::responses::ImportOptions;
use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{ImportCommands, ImportRunArgs};
use crate::context::AppContext;
use crate::output::output;

/// Handle `acx import`.
pub async fn handle(
    action: &ImportCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ImportCommands::Preview { archive, target } => {
            let options = ImportOptions {
                target_academy_id: target.clone(),
                ..ctx.config.import.options()
            };
            let preview = ctx
                .orchestrator
                .preview_with_options(archive, &options)
                .await
                .with_context(|| format!("failed to preview {}", archive.display()))?;
            output(&preview, flags.format)
        }
        ImportCommands::Run(args) => {
            let options = run_options(args, ctx.config.import.options());
            tracing::debug!(
                archive = %args.archive.display(),
                overwrite = options.overwrite_existing,
                rename = options.modify_slugs_on_conflict,
                skip = options.skip_conflicting_content,
                target = options.target_academy_id.as_deref(),
                "running import"
            );
            let result = ctx
                .orchestrator
                .import_academy(&args.archive, options)
                .await
                .with_context(|| format!("failed to import {}", args.archive.display()))?;
            output(&result, flags.format)
        }
    }
}

/// Configured defaults with the command-line switches applied on top.
fn run_options(args: &ImportRunArgs, mut options: ImportOptions) -> ImportOptions {
    if args.overwrite {
        options.overwrite_existing = true;
    }
    if args.no_rename {
        options.modify_slugs_on_conflict = false;
    }
    if args.skip_conflicts {
        options.skip_conflicting_content = true;
    }
    if args.target.is_some() {
        options.target_academy_id.clone_from(&args.target);
    }
    options
}
