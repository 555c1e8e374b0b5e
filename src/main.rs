mod config;
mod dispatch;
mod gamerpower;
mod store;
mod telegram;

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::gamerpower::GamerPowerClient;
use crate::store::SentStore;
use crate::telegram::TelegramNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,giveawaybot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::resolve(&config_path);

    if config.bot_token.is_empty() {
        anyhow::bail!("bot_token missing: set it in the config file or the BOT_TOKEN env var");
    }
    if config.channel_ids.is_empty() {
        anyhow::bail!("channel_ids missing: set it in the config file or the CHANNEL_IDS env var");
    }

    info!("Configuration loaded successfully");
    info!("  Channels: {:?}", config.channel_ids);
    info!("  Poll interval: {}s", config.poll_interval_secs);
    info!("  Sent file: {}", config.sent_file.display());
    info!("  Single run: {}", config.single_run);

    let source = GamerPowerClient::new();
    let notifier = TelegramNotifier::new(&config.bot_token);
    let store = SentStore::new(config.sent_file.clone());

    info!("Bot is starting...");
    dispatch::run(&source, &notifier, &store, &config).await
}
