use acx_config::AcxConfig;
use anyhow::Context;
use clap::Parser;

mod cli;
mod commands;
mod context;
mod output;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("acx error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();

    match &cli.command {
        cli::Commands::Schema(args) => return commands::schema::handle(args, &flags),
        cli::Commands::Validate(args) => return commands::validate::handle(args, &flags),
        _ => {}
    }

    let config = AcxConfig::load_with_dotenv(flags.config.as_deref())
        .context("failed to load acx configuration")?;
    tracing::debug!(
        packages_dir = %config.storage.packages_dir.display(),
        database = %config.database.path.display(),
        format = %config.packaging.format,
        "configuration loaded"
    );

    if let cli::Commands::Package { action } = &cli.command {
        return commands::package::handle(action, &config, &flags);
    }

    let ctx = context::AppContext::init(config)
        .await
        .context("failed to initialize acx application context")?;

    commands::dispatch::dispatch(cli.command, &ctx, &flags).await
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ACX_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
