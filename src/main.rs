//! ripsync - Download audio and sync it to portable MP3 players

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod config;
mod device;
mod error;
mod fetch;
mod sync;
mod tools;
mod utils;

use cli::{Cli, Commands};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "ripsync=debug"
    } else {
        "ripsync=info"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Download {
            url,
            playlist,
            name,
        } => {
            cli::commands::download(&config, url, playlist, name).await?;
        }
        Commands::Sync {
            target,
            yes,
            dry_run,
        } => {
            cli::commands::sync(&config, target, yes, dry_run).await?;
        }
        Commands::Run {
            download_only,
            sync_only,
        } => {
            cli::commands::run(&config, download_only, sync_only).await?;
        }
        Commands::Devices => {
            cli::commands::devices()?;
        }
        Commands::Completion { shell } => {
            cli::commands::completion(shell);
        }
    }

    Ok(())
}
