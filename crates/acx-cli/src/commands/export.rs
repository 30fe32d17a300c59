use acx_package::PackageOptions;
use anyhow::Context;
use serde_json::{Value, json};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ExportArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `acx export`.
pub async fn handle(args: &ExportArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let exported_by = args
        .exported_by
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--exported-by must be a JSON value")?;

    let doc = ctx
        .store
        .export_academy(&args.academy_id, exported_by)
        .await
        .with_context(|| format!("failed to export academy {}", args.academy_id))?;

    if args.package {
        let options = PackageOptions {
            format: ctx.config.packaging.format,
            compression: ctx.config.packaging.compression,
        };
        let manifest = ctx
            .packages()
            .create_package(&doc, options)
            .context("failed to build package")?;
        return output(&manifest, flags.format);
    }

    match &args.out {
        Some(path) => {
            let text = serde_json::to_string_pretty(&doc)?;
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            output(
                &json!({
                    "academyId": args.academy_id,
                    "path": path,
                    "checksum": doc.export_metadata.checksum,
                    "contentCounts": doc.export_metadata.content_counts,
                }),
                flags.format,
            )
        }
        None => output(&doc, flags.format),
    }
}
