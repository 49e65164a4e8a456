mod bot;
mod cache;
mod config;
mod error;
mod model;
mod provider;
mod scheduler;
mod service;
mod util;

use std::sync::Arc;

use serenity::all::{ChannelId, GuildId};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::bot::start::{build_client, Handler};
use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::AppError;
use crate::provider::{
    quicket::QuicketClient, sheets::SheetsClient, wafer::WaferClient, youtube::YouTubeClient,
    CalendarProvider, SpeakerProvider,
};
use crate::scheduler::Providers;
use crate::service::broadcast_channels::DiscordChannelGateway;
use crate::service::notify::DiscordNotifier;
use crate::service::registration::RegistrationService;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Arc::new(Config::from_env()?);
    let http_client = reqwest::Client::new();

    let cache = Arc::new(CacheStore::new());
    let registry = Arc::new(SheetsClient::new(http_client.clone(), &config.sheets));
    let registration = Arc::new(RegistrationService::new(cache.clone(), registry));

    let (ready_tx, ready_rx) = watch::channel(false);
    let handler = Handler::new(config.clone(), registration, ready_tx);
    let mut client = build_client(&config.discord.token, handler).await?;
    let discord_http = client.http.clone();

    let wafer = Arc::new(WaferClient::new(http_client.clone(), &config.wafer));
    let providers = Providers {
        tickets: Arc::new(QuicketClient::new(http_client.clone(), &config.quicket)),
        speakers: wafer.clone() as Arc<dyn SpeakerProvider>,
        calendar: wafer as Arc<dyn CalendarProvider>,
        broadcasts: Arc::new(YouTubeClient::new(http_client, &config.youtube)),
    };
    let notifier = Arc::new(DiscordNotifier::new(discord_http.clone()));
    let gateway = Arc::new(DiscordChannelGateway::new(
        discord_http,
        GuildId::new(config.discord.guild_id),
        ChannelId::new(config.youtube.category_id),
    ));

    tokio::spawn(async move {
        if let Err(e) = scheduler::start(config, cache, providers, notifier, gateway, ready_rx).await
        {
            tracing::error!("Scheduler error: {e}");
        }
    });

    tracing::info!("Starting Discord client");
    client.start().await?;
    Ok(())
}
