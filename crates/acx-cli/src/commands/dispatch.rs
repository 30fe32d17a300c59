use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a store-backed command to its handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Import { action } => commands::import::handle(&action, ctx, flags).await,
        Commands::Export(args) => commands::export::handle(&args, ctx, flags).await,
        Commands::Package { .. } | Commands::Validate(_) | Commands::Schema(_) => {
            unreachable!("package/validate/schema are pre-dispatched in main")
        }
    }
}
