//! Outbound Discord messaging.

use std::sync::Arc;

use serenity::all::{ChannelId, CreateMessage};
use serenity::async_trait;
use serenity::http::Http;

use crate::error::AppError;

/// Sends announcement text to a channel.
///
/// The announcement loops depend on this seam rather than on the Discord HTTP
/// client directly; tests substitute a recording implementation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), AppError>;
}

/// Notifier backed by the Discord HTTP client.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn send(&self, channel: ChannelId, text: &str) -> Result<(), AppError> {
        channel
            .send_message(&self.http, CreateMessage::new().content(text))
            .await?;
        Ok(())
    }
}

/// Mirror of operational log lines into the configured Discord log channel.
///
/// Every line also goes through `tracing`; the Discord copy is best-effort
/// and a failed send is only noted locally.
pub struct Logbook {
    notifier: Arc<dyn Notifier>,
    channel: ChannelId,
}

impl Logbook {
    pub fn new(notifier: Arc<dyn Notifier>, channel: ChannelId) -> Self {
        Self { notifier, channel }
    }

    /// Logs a message locally and mirrors it to the log channel.
    pub async fn record(&self, message: &str) {
        tracing::info!("{message}");
        if let Err(e) = self.notifier.send(self.channel, message).await {
            tracing::warn!("Failed to mirror log line to Discord: {e}");
        }
    }
}
