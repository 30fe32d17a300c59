use acx_core::validation::validate;
use anyhow::bail;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ValidateArgs;
use crate::commands::read_document;
use crate::output::output;

/// Handle `acx validate`.
pub fn handle(args: &ValidateArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let doc = read_document(&args.document)?;
    let report = validate(&doc);
    output(&report, flags.format)?;
    if !report.valid {
        bail!(
            "{} is invalid ({} error(s))",
            args.document.display(),
            report.errors.len()
        );
    }
    Ok(())
}
