//! Main entry point for Pipebot.

use anyhow::Context as _;
use clap::Parser;
use pipebot::PipeBot;
use pipebot_common::init_logging;
use pipebot_config::{Config, ConfigLoader};
use std::path::PathBuf;
use tracing::info;

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "pipebot", version, about = "Chat command bot with cooldowns, filters and pipes")]
struct Args {
    /// Configuration file; defaults to PIPEBOT_CONFIG_PATH, config.yaml or config.yml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read commands from the terminal instead of connecting to Discord.
    #[arg(long)]
    console: bool,

    /// Log filter directive overriding the configured level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging(config.logging.to_logging_config()).context("Failed to initialize logging")?;
    info!(version = env!("CARGO_PKG_VERSION"), console = args.console, "Starting Pipebot");

    let bot = PipeBot::new(config).await.context("Failed to start services")?;

    if args.console {
        bot.run_console().await.context("Console session failed")?;
    } else {
        bot.run_discord().await.context("Discord session failed")?;
    }

    info!("Pipebot stopped");
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_config(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load().context("Failed to load configuration")?,
    };

    if let Some(level) = &args.log_level {
        config.logging.level.clone_from(level);
    }

    Ok(config)
}
