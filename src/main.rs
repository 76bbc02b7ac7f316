//! sweeparr - Plex-to-Sonarr watched-episode relay
#![doc = "Main entry point for the sweeparr binary."]

use anyhow::Result;

use sweeparr::cli::{Cli, Commands};
use sweeparr::commands;
use sweeparr::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_logging(&cli.logging())?;

    match cli.command() {
        Commands::Serve { bind } => {
            tracing::info!("Starting sweeparr on {}", bind);
            commands::serve::run_serve(cli.config, cli.db, &bind).await?;
        }
        Commands::History { limit } => {
            tracing::debug!("Listing watched history from {}", cli.db.display());
            commands::history::handle_history(&cli.db, limit as usize)?;
        }
        Commands::CheckConfig => {
            commands::check_config::handle_check_config(&cli.config)?;
        }
    }

    Ok(())
}
