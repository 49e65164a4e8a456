//! Discord client construction and event dispatch.

use std::sync::Arc;

use serenity::all::{Context, EventHandler, GatewayIntents, Member, Message, Ready};
use serenity::async_trait;
use serenity::Client;
use tokio::sync::{watch, OnceCell};

use crate::bot::handler;
use crate::bot::server_info::ServerInfo;
use crate::config::Config;
use crate::error::AppError;
use crate::service::registration::RegistrationService;

pub struct Handler {
    config: Arc<Config>,
    registration: Arc<RegistrationService>,
    server_info: OnceCell<ServerInfo>,
    ready_tx: watch::Sender<bool>,
}

impl Handler {
    pub fn new(
        config: Arc<Config>,
        registration: Arc<RegistrationService>,
        ready_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            config,
            registration,
            server_info: OnceCell::new(),
            ready_tx,
        }
    }

    /// Returns the resolved guild handles, resolving them on first use.
    async fn server_info(&self, ctx: &Context) -> Result<&ServerInfo, AppError> {
        self.server_info
            .get_or_try_init(|| ServerInfo::resolve(&ctx.http, &self.config.discord))
            .await
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!(
            "{} connected to {} guild(s)",
            ready.user.name,
            ready.guilds.len()
        );
        if let Err(e) = self.server_info(&ctx).await {
            tracing::error!("Failed to resolve server roles and channels: {e}");
        }
        // The periodic tasks wait on this before their first fetch.
        let _ = self.ready_tx.send(true);
    }

    async fn guild_member_addition(&self, ctx: Context, member: Member) {
        if member.user.bot {
            return;
        }
        let info = match self.server_info(&ctx).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!("Cannot greet {}: {e}", member.user.name);
                return;
            }
        };
        handler::member::greet_new_member(&ctx, &member, &self.config, info).await;
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || !self.config.features.registration {
            return;
        }
        let Some(barcode) = handler::register::parse_register(&msg.content) else {
            return;
        };
        let info = match self.server_info(&ctx).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!("Cannot handle registration: {e}");
                return;
            }
        };
        handler::register::handle_registration(
            &ctx,
            &msg,
            barcode,
            &self.registration,
            &self.config,
            info,
        )
        .await;
    }
}

/// Builds the Discord client with the gateway intents the handlers need.
pub async fn build_client(token: &str, handler: Handler) -> Result<Client, AppError> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let client = Client::builder(token, intents)
        .event_handler(handler)
        .await?;
    Ok(client)
}
