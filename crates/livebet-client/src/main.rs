//! Livebet client entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use livebet_core::BetTicket;
use rust_decimal::Decimal;
use tracing::info;

/// Real-time betting feed client
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via LIVEBET_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow the feed and keep local state current (default)
    Watch,
    /// Place one bet and wait for its confirmation
    Bet {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        match_id: String,
        /// Stake amount
        #[arg(long)]
        amount: Decimal,
        /// Payout multiplier
        #[arg(long)]
        odds: Decimal,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    livebet_ws::init_crypto();

    let args = Args::parse();

    livebet_telemetry::init_logging()?;

    info!("Starting livebet client v{}", env!("CARGO_PKG_VERSION"));

    let config_path = args
        .config
        .or_else(|| std::env::var("LIVEBET_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = livebet_client::AppConfig::from_file(&config_path)?;
    info!(ws_url = %config.ws_url, api_url = %config.api_url, "Configuration loaded");

    let app = livebet_client::Application::new(&config);

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => app.run().await?,
        Command::Bet {
            user_id,
            match_id,
            amount,
            odds,
        } => {
            let ticket = BetTicket::new(user_id, match_id, amount, odds);
            app.run_bet(ticket).await?;
        }
    }

    Ok(())
}
