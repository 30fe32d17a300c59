use std::collections::BTreeMap;

use acx_core::conflict::ConflictReport;
use acx_core::entities::ExportDocument;
use acx_core::responses::{ImportOptions, ImportPreview, ImportResult};
use acx_core::validation::ValidationReport;
use acx_package::{PackageListing, PackageManifest};
use anyhow::bail;
use schemars::{Schema, schema_for};

use crate::cli::GlobalFlags;
use crate::cli::root_commands::SchemaArgs;
use crate::output::output;

fn schemas() -> BTreeMap<&'static str, Schema> {
    BTreeMap::from([
        ("export-document", schema_for!(ExportDocument)),
        ("manifest", schema_for!(PackageManifest)),
        ("package-listing", schema_for!(PackageListing)),
        ("validation-report", schema_for!(ValidationReport)),
        ("conflict-report", schema_for!(ConflictReport)),
        ("import-options", schema_for!(ImportOptions)),
        ("import-preview", schema_for!(ImportPreview)),
        ("import-result", schema_for!(ImportResult)),
    ])
}

/// Handle `acx schema`.
pub fn handle(args: &SchemaArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut all = schemas();
    match args.type_name.as_deref() {
        None => output(&all, flags.format),
        Some(name) => match all.remove(name) {
            Some(schema) => output(&schema, flags.format),
            None => bail!(
                "unknown schema type '{name}' (known: {})",
                all.keys().copied().collect::<Vec<_>>().join(", ")
            ),
        },
    }
}
