mod announcement;
mod auth;
mod bot;
mod catalog;
mod config;
mod dispatch;
mod error;
mod health;
mod markdown;
mod pipeline;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::AllowList;
use crate::catalog::{CatalogResolver, HttpCatalog};
use crate::config::Config;
use crate::dispatch::TelegramChannel;
use crate::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,releasebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // An explicit path must exist; the default one may be replaced by env vars
    let explicit_path = std::env::args().nth(1).map(PathBuf::from);
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path, explicit_path.is_some())
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Channel: {}", config.telegram.channel_id);
    info!("  Allowed users: {:?}", config.telegram.allowed_user_ids);
    info!("  Catalog: {}", config.catalog.url);
    info!("  Catalog timeout: {}s", config.catalog.timeout_secs);

    let bot = Bot::new(&config.telegram.bot_token);

    let catalog = HttpCatalog::new(config.catalog.url.clone(), config.catalog.timeout())?;
    let channel = TelegramChannel::new(
        bot.clone(),
        config.telegram.channel_id,
        &config.announcement.banner_url,
    )?;

    let allow_list = AllowList::new(config.telegram.allowed_user_ids.iter().copied());
    info!("  Allow-list size: {}", allow_list.len());

    let pipeline = Arc::new(Pipeline::new(
        allow_list,
        CatalogResolver::new(Arc::new(catalog)),
        config.announcement.clone(),
        Arc::new(channel),
    ));

    if config.health.enabled {
        let bind = config.health.bind.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(&bind).await {
                error!("Liveness endpoint stopped: {:#}", e);
            }
        });
    }

    info!("Bot is starting...");
    bot::run(bot, pipeline).await?;

    Ok(())
}
