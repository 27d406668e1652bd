//! gatewatch - live allow/block view of HAProxy connection tables.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use gatewatch::cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run => gatewatch::commands::run::run(&cli.config).await,
        Commands::Once => gatewatch::commands::once::run(&cli.config).await,
        Commands::Check { ip } => gatewatch::commands::check::run(&ip, &cli.config).await,
        Commands::Config { default } => {
            gatewatch::commands::show_config::run(default, &cli.config).await
        }
        Commands::Version => {
            println!("gatewatch {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
