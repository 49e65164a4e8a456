//! Reconciliation of the broadcast channel category.
//!
//! Keeps one text channel per live broadcast inside the configured category:
//! duplicate-titled channels are removed (first seen wins), each broadcast gets
//! its channel created or updated, already-started broadcasts are parked at a
//! fixed low-priority position, and channels matching no current broadcast are
//! deleted. A failure on one item is logged and the cycle continues; whatever
//! partial state remains is corrected by the next cycle.

use std::collections::HashSet;
use std::sync::Arc;

use serenity::all::{
    ChannelId, ChannelType, CreateChannel, EditChannel, GuildId,
};
use serenity::async_trait;
use serenity::http::Http;

use crate::cache::ChannelBroadcastMap;
use crate::error::AppError;
use crate::model::Broadcast;

/// Channel position for broadcasts that started over an hour ago. Fresh
/// broadcasts occupy positions 0.. in start-time order, so anything here sinks
/// below them.
const STALE_CHANNEL_POSITION: u16 = 99;

/// A text channel as the reconciler sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: ChannelId,
    pub name: String,
}

/// Channel-management operations the reconciler needs.
#[async_trait]
pub trait ChannelGateway: Send + Sync {
    /// Text channels currently in the broadcast category, ordered by position.
    async fn channels_in_category(&self) -> Result<Vec<ChannelHandle>, AppError>;

    async fn create_channel(
        &self,
        name: &str,
        topic: &str,
        position: u16,
    ) -> Result<ChannelHandle, AppError>;

    async fn update_channel(
        &self,
        id: ChannelId,
        topic: &str,
        position: u16,
    ) -> Result<(), AppError>;

    async fn delete_channel(&self, id: ChannelId) -> Result<(), AppError>;

    /// Sends a message to the channel and pins it.
    async fn send_pinned(&self, id: ChannelId, text: &str) -> Result<(), AppError>;
}

/// One reconciliation pass over the broadcast category.
pub struct BroadcastChannelSync {
    gateway: Arc<dyn ChannelGateway>,
}

impl BroadcastChannelSync {
    pub fn new(gateway: Arc<dyn ChannelGateway>) -> Self {
        Self { gateway }
    }

    /// Reconciles the category against the given broadcast list and returns
    /// the resulting channel→broadcast mapping.
    ///
    /// Only the initial channel listing is fatal to the pass; per-item
    /// failures are logged and skipped.
    ///
    /// # Arguments
    /// - `broadcasts` - Current broadcasts, ordered by start time
    ///
    /// # Returns
    /// - `Ok(ChannelBroadcastMap)` - Mapping for every broadcast that has a
    ///   usable channel after this pass
    /// - `Err(AppError)` - The category listing could not be fetched
    pub async fn reconcile(
        &self,
        broadcasts: &[Broadcast],
    ) -> Result<ChannelBroadcastMap, AppError> {
        let existing = self.gateway.channels_in_category().await?;
        let kept = self.remove_duplicates(existing).await;

        let mut map = ChannelBroadcastMap::new();
        let mut fresh_position: u16 = 0;
        for broadcast in broadcasts {
            let position = if broadcast.stale {
                STALE_CHANNEL_POSITION
            } else {
                let position = fresh_position;
                fresh_position += 1;
                position
            };

            match self.ensure_channel(&kept, broadcast, position).await {
                Some(channel_id) => {
                    map.insert(channel_id, broadcast.clone());
                }
                None => continue,
            }
        }

        self.remove_orphans(&kept, broadcasts).await;
        Ok(map)
    }

    /// Deletes channels whose title already appeared earlier in the listing,
    /// keeping the first seen.
    async fn remove_duplicates(&self, channels: Vec<ChannelHandle>) -> Vec<ChannelHandle> {
        let mut kept = Vec::with_capacity(channels.len());
        let mut seen: HashSet<String> = HashSet::new();
        for channel in channels {
            if seen.insert(channel.name.clone()) {
                kept.push(channel);
                continue;
            }
            tracing::warn!("Deleting duplicate-titled channel '{}'", channel.name);
            if let Err(e) = self.gateway.delete_channel(channel.id).await {
                tracing::error!("Failed to delete duplicate channel '{}': {e}", channel.name);
            }
        }
        kept
    }

    /// Updates the same-titled existing channel or creates a new one with the
    /// pinned title/link/description messages. Returns `None` when creation
    /// failed and the broadcast has no channel this pass.
    async fn ensure_channel(
        &self,
        existing: &[ChannelHandle],
        broadcast: &Broadcast,
        position: u16,
    ) -> Option<ChannelId> {
        if let Some(channel) = existing.iter().find(|c| c.name == broadcast.title) {
            if let Err(e) = self
                .gateway
                .update_channel(channel.id, &broadcast.description, position)
                .await
            {
                // The channel still exists; keep it mapped and let the next
                // cycle retry the edit.
                tracing::error!("Failed to update channel '{}': {e}", broadcast.title);
            }
            return Some(channel.id);
        }

        let channel = match self
            .gateway
            .create_channel(&broadcast.title, &broadcast.description, position)
            .await
        {
            Ok(channel) => channel,
            Err(e) => {
                tracing::error!("Failed to create channel '{}': {e}", broadcast.title);
                return None;
            }
        };

        for text in [
            broadcast.original_title.as_str(),
            broadcast.link().as_str(),
            broadcast.description.as_str(),
        ] {
            if text.is_empty() {
                continue;
            }
            if let Err(e) = self.gateway.send_pinned(channel.id, text).await {
                tracing::error!("Failed to pin message in '{}': {e}", broadcast.title);
            }
        }

        Some(channel.id)
    }

    /// Deletes kept channels whose title matches no current broadcast.
    async fn remove_orphans(&self, kept: &[ChannelHandle], broadcasts: &[Broadcast]) {
        let titles: HashSet<&str> = broadcasts.iter().map(|b| b.title.as_str()).collect();
        for channel in kept {
            if titles.contains(channel.name.as_str()) {
                continue;
            }
            tracing::info!("Deleting channel '{}' with no matching broadcast", channel.name);
            if let Err(e) = self.gateway.delete_channel(channel.id).await {
                tracing::error!("Failed to delete orphaned channel '{}': {e}", channel.name);
            }
        }
    }
}

/// Channel gateway backed by the Discord HTTP client.
pub struct DiscordChannelGateway {
    http: Arc<Http>,
    guild_id: GuildId,
    category_id: ChannelId,
}

impl DiscordChannelGateway {
    pub fn new(http: Arc<Http>, guild_id: GuildId, category_id: ChannelId) -> Self {
        Self {
            http,
            guild_id,
            category_id,
        }
    }
}

#[async_trait]
impl ChannelGateway for DiscordChannelGateway {
    async fn channels_in_category(&self) -> Result<Vec<ChannelHandle>, AppError> {
        let channels = self.guild_id.channels(&self.http).await?;

        let mut in_category: Vec<_> = channels
            .into_values()
            .filter(|channel| {
                channel.kind == ChannelType::Text && channel.parent_id == Some(self.category_id)
            })
            .collect();
        in_category.sort_by_key(|channel| (channel.position, channel.id));

        Ok(in_category
            .into_iter()
            .map(|channel| ChannelHandle {
                id: channel.id,
                name: channel.name,
            })
            .collect())
    }

    async fn create_channel(
        &self,
        name: &str,
        topic: &str,
        position: u16,
    ) -> Result<ChannelHandle, AppError> {
        let channel = self
            .guild_id
            .create_channel(
                &self.http,
                CreateChannel::new(name)
                    .kind(ChannelType::Text)
                    .category(self.category_id)
                    .topic(topic)
                    .position(position),
            )
            .await?;
        Ok(ChannelHandle {
            id: channel.id,
            name: channel.name,
        })
    }

    async fn update_channel(
        &self,
        id: ChannelId,
        topic: &str,
        position: u16,
    ) -> Result<(), AppError> {
        id.edit(
            &self.http,
            EditChannel::new().topic(topic).position(position),
        )
        .await?;
        Ok(())
    }

    async fn delete_channel(&self, id: ChannelId) -> Result<(), AppError> {
        id.delete(&self.http).await?;
        Ok(())
    }

    async fn send_pinned(&self, id: ChannelId, text: &str) -> Result<(), AppError> {
        let message = id.say(&self.http, text).await?;
        message.pin(&self.http).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use tokio::sync::Mutex;

    fn broadcast(id: &str, title: &str, stale: bool) -> Broadcast {
        Broadcast {
            id: id.to_string(),
            title: title.to_string(),
            original_title: title.to_uppercase(),
            description: format!("About {title}"),
            start_time: Utc.with_ymd_and_hms(2021, 10, 7, 9, 0, 0).unwrap()
                + Duration::hours(1),
            live_chat_id: String::new(),
            stale,
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    enum Op {
        Create(String, u16),
        Update(ChannelId, u16),
        Delete(ChannelId),
        Pin(ChannelId, String),
    }

    /// Gateway over a fixed channel listing, recording every mutation.
    #[derive(Default)]
    struct FakeGateway {
        listing: Vec<ChannelHandle>,
        ops: Mutex<Vec<Op>>,
        fail_create: Option<String>,
        next_id: Mutex<u64>,
    }

    impl FakeGateway {
        fn with_listing(listing: Vec<ChannelHandle>) -> Self {
            Self {
                listing,
                next_id: Mutex::new(1000),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl ChannelGateway for FakeGateway {
        async fn channels_in_category(&self) -> Result<Vec<ChannelHandle>, AppError> {
            Ok(self.listing.clone())
        }

        async fn create_channel(
            &self,
            name: &str,
            _topic: &str,
            position: u16,
        ) -> Result<ChannelHandle, AppError> {
            if self.fail_create.as_deref() == Some(name) {
                return Err(AppError::NotFound("create refused".to_string()));
            }
            let mut next_id = self.next_id.lock().await;
            *next_id += 1;
            let handle = ChannelHandle {
                id: ChannelId::new(*next_id),
                name: name.to_string(),
            };
            self.ops
                .lock()
                .await
                .push(Op::Create(name.to_string(), position));
            Ok(handle)
        }

        async fn update_channel(
            &self,
            id: ChannelId,
            _topic: &str,
            position: u16,
        ) -> Result<(), AppError> {
            self.ops.lock().await.push(Op::Update(id, position));
            Ok(())
        }

        async fn delete_channel(&self, id: ChannelId) -> Result<(), AppError> {
            self.ops.lock().await.push(Op::Delete(id));
            Ok(())
        }

        async fn send_pinned(&self, id: ChannelId, text: &str) -> Result<(), AppError> {
            self.ops.lock().await.push(Op::Pin(id, text.to_string()));
            Ok(())
        }
    }

    fn handle(id: u64, name: &str) -> ChannelHandle {
        ChannelHandle {
            id: ChannelId::new(id),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_titles_keep_first_seen() {
        let gateway = Arc::new(FakeGateway::with_listing(vec![
            handle(1, "talk-a"),
            handle(2, "talk-a"),
        ]));
        let sync = BroadcastChannelSync::new(gateway.clone());

        let map = sync.reconcile(&[broadcast("a", "talk-a", false)]).await.unwrap();

        // The later duplicate is deleted and the survivor carries the mapping.
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&ChannelId::new(1)).unwrap().id, "a");
        let ops = gateway.ops.lock().await;
        assert!(ops.contains(&Op::Delete(ChannelId::new(2))));
        assert!(ops.contains(&Op::Update(ChannelId::new(1), 0)));
    }

    #[tokio::test]
    async fn creates_missing_channels_with_pins() {
        let gateway = Arc::new(FakeGateway::with_listing(Vec::new()));
        let sync = BroadcastChannelSync::new(gateway.clone());

        let map = sync.reconcile(&[broadcast("a", "talk-a", false)]).await.unwrap();

        assert_eq!(map.len(), 1);
        let ops = gateway.ops.lock().await;
        assert_eq!(ops[0], Op::Create("talk-a".to_string(), 0));
        // Pinned title, link and description, in order.
        assert!(matches!(&ops[1], Op::Pin(_, text) if text == "TALK-A"));
        assert!(matches!(&ops[2], Op::Pin(_, text) if text == "https://youtu.be/a"));
        assert!(matches!(&ops[3], Op::Pin(_, text) if text == "About talk-a"));
    }

    #[tokio::test]
    async fn stale_broadcasts_sink_to_fixed_position() {
        let gateway = Arc::new(FakeGateway::with_listing(Vec::new()));
        let sync = BroadcastChannelSync::new(gateway.clone());

        sync.reconcile(&[
            broadcast("old", "talk-old", true),
            broadcast("a", "talk-a", false),
            broadcast("b", "talk-b", false),
        ])
        .await
        .unwrap();

        let ops = gateway.ops.lock().await;
        let creates: Vec<_> = ops
            .iter()
            .filter_map(|op| match op {
                Op::Create(name, position) => Some((name.as_str(), *position)),
                _ => None,
            })
            .collect();
        assert_eq!(
            creates,
            vec![
                ("talk-old", STALE_CHANNEL_POSITION),
                ("talk-a", 0),
                ("talk-b", 1),
            ]
        );
    }

    #[tokio::test]
    async fn deletes_channels_without_broadcasts() {
        let gateway = Arc::new(FakeGateway::with_listing(vec![
            handle(1, "talk-a"),
            handle(2, "talk-gone"),
        ]));
        let sync = BroadcastChannelSync::new(gateway.clone());

        let map = sync.reconcile(&[broadcast("a", "talk-a", false)]).await.unwrap();

        assert_eq!(map.len(), 1);
        let ops = gateway.ops.lock().await;
        assert!(ops.contains(&Op::Delete(ChannelId::new(2))));
        assert!(!ops.contains(&Op::Delete(ChannelId::new(1))));
    }

    #[tokio::test]
    async fn create_failure_skips_item_and_continues() {
        let gateway = Arc::new(FakeGateway {
            fail_create: Some("talk-a".to_string()),
            next_id: Mutex::new(1000),
            ..Default::default()
        });
        let sync = BroadcastChannelSync::new(gateway.clone());

        let map = sync
            .reconcile(&[broadcast("a", "talk-a", false), broadcast("b", "talk-b", false)])
            .await
            .unwrap();

        // talk-a has no channel this pass; talk-b still went through.
        assert_eq!(map.len(), 1);
        assert!(map.values().any(|b| b.id == "b"));
    }
}
