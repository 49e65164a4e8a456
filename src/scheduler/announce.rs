//! Announcement ticks.
//!
//! Each tick asks the cache for the items whose start time fell inside the
//! lookahead window and notifies them, marking each item announced immediately
//! after its send succeeds. A failed send leaves the item unmarked so the next
//! tick retries it: announcements are at-least-once, never early.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::all::ChannelId;

use crate::cache::CacheStore;
use crate::service::notify::Notifier;

pub struct Announcer {
    cache: Arc<CacheStore>,
    notifier: Arc<dyn Notifier>,
}

impl Announcer {
    pub fn new(cache: Arc<CacheStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { cache, notifier }
    }

    /// Announces every unannounced event starting within the lookahead, into
    /// the shared announcement channel.
    pub async fn announce_due_events(
        &self,
        now: DateTime<Utc>,
        channel: ChannelId,
        lookahead_minutes: i64,
    ) {
        for event in self.cache.due_events(now, Some(lookahead_minutes)).await {
            let venue = if event.location.is_empty() {
                String::new()
            } else {
                format!(" at {}", event.location)
            };
            let text = format!(
                "@everyone The event **{}** is happening{venue} in {lookahead_minutes} minutes!",
                event.name
            );
            match self.notifier.send(channel, &text).await {
                Ok(()) => self.cache.mark_event_announced(&event.name).await,
                Err(e) => {
                    tracing::error!("Failed to announce event '{}': {e}", event.name);
                }
            }
        }
    }

    /// Announces every unannounced broadcast starting within the lookahead,
    /// each into its own channel.
    pub async fn announce_due_broadcasts(&self, now: DateTime<Utc>, lookahead_seconds: i64) {
        for (channel, broadcast) in self
            .cache
            .due_broadcasts(now, Some(lookahead_seconds))
            .await
        {
            let text = format!(
                "@here **{}** is starting soon! Watch live: {}",
                broadcast.original_title,
                broadcast.link()
            );
            match self.notifier.send(channel, &text).await {
                Ok(()) => self.cache.mark_channel_announced(channel).await,
                Err(e) => {
                    tracing::error!(
                        "Failed to announce broadcast '{}': {e}",
                        broadcast.original_title
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ChannelBroadcastMap;
    use crate::model::{Broadcast, CalendarEvent};
    use crate::service::notify::test_support::RecordingNotifier;
    use chrono::{Duration, TimeZone};

    fn event(name: &str, start: DateTime<Utc>) -> CalendarEvent {
        CalendarEvent {
            name: name.to_string(),
            start,
            location: "Main Track".to_string(),
        }
    }

    fn broadcast(id: &str, start_time: DateTime<Utc>) -> Broadcast {
        Broadcast {
            id: id.to_string(),
            title: format!("talk-{id}"),
            original_title: format!("Talk {id}"),
            description: String::new(),
            start_time,
            live_chat_id: String::new(),
            stale: false,
        }
    }

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 10, 7, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn announces_due_events_exactly_once() {
        let now = clock();
        let cache = Arc::new(CacheStore::new());
        cache
            .replace_events(vec![
                event("A", now + Duration::minutes(3)),
                event("B", now + Duration::minutes(10)),
            ])
            .await;
        let notifier = Arc::new(RecordingNotifier::default());
        let announcer = Announcer::new(cache, notifier.clone());
        let channel = ChannelId::new(7);

        announcer.announce_due_events(now, channel, 5).await;
        // Same clock, second tick: nothing left to announce.
        announcer.announce_due_events(now, channel, 5).await;

        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, channel);
        assert!(sent[0].1.contains("**A**"));
        assert!(sent[0].1.contains("at Main Track"));
        assert!(sent[0].1.contains("5 minutes"));
    }

    #[tokio::test]
    async fn failed_send_is_retried_next_tick() {
        let now = clock();
        let cache = Arc::new(CacheStore::new());
        cache
            .replace_events(vec![event("A", now + Duration::minutes(3))])
            .await;
        let failing = Arc::new(RecordingNotifier {
            fail: true,
            ..Default::default()
        });
        let announcer = Announcer::new(cache.clone(), failing);
        let channel = ChannelId::new(7);

        announcer.announce_due_events(now, channel, 5).await;

        // Send failed, so A stays unmarked and a healthy tick delivers it.
        let notifier = Arc::new(RecordingNotifier::default());
        let announcer = Announcer::new(cache, notifier.clone());
        announcer.announce_due_events(now, channel, 5).await;

        assert_eq!(notifier.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn broadcasts_go_to_their_own_channels() {
        let now = clock();
        let cache = Arc::new(CacheStore::new());
        let mut map = ChannelBroadcastMap::new();
        map.insert(ChannelId::new(1), broadcast("a", now + Duration::seconds(40)));
        map.insert(ChannelId::new(2), broadcast("b", now + Duration::hours(4)));
        cache.replace_broadcast_channels(map).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let announcer = Announcer::new(cache, notifier.clone());

        announcer.announce_due_broadcasts(now, 60).await;
        announcer.announce_due_broadcasts(now, 60).await;

        let sent = notifier.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId::new(1));
        assert!(sent[0].1.contains("Talk a"));
        assert!(sent[0].1.contains("https://youtu.be/a"));
    }
}
