//! In-memory caches of the externally fetched snapshots.
//!
//! The `CacheStore` owns every piece of shared state in the bot: the latest
//! snapshot per data source plus the already-announced sets. Snapshots are
//! held as `Arc`s and swapped whole on refresh, never mutated in place, so a
//! reader observing a snapshot mid-refresh always sees a complete, consistent
//! one. Nothing here performs I/O; providers fetch, schedulers replace,
//! evaluators read.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serenity::all::ChannelId;
use tokio::sync::RwLock;

use crate::model::{Broadcast, CalendarEvent, Ticket};

/// Mapping from a destination text channel to its associated broadcast.
///
/// Rebuilt wholesale by each channel reconciliation cycle; the channel id is
/// the announcement identity for the broadcast path.
pub type ChannelBroadcastMap = HashMap<ChannelId, Broadcast>;

/// Process-wide cache of external snapshots and announced-item sets.
///
/// Announced sets grow monotonically and are never pruned within a process
/// lifetime; a restart clears them, so an item already announced before the
/// restart may be announced again. That duplicate is an accepted risk.
#[derive(Default)]
pub struct CacheStore {
    tickets: RwLock<Arc<HashMap<String, Ticket>>>,
    speaker_barcodes: RwLock<Arc<HashSet<String>>>,
    events: RwLock<Arc<Vec<CalendarEvent>>>,
    broadcast_channels: RwLock<Arc<ChannelBroadcastMap>>,
    announced_events: RwLock<HashSet<String>>,
    announced_channels: RwLock<HashSet<ChannelId>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ticket snapshot with the given records.
    ///
    /// Duplicate barcodes are resolved last-write-wins: the later record
    /// replaces the earlier one and a warning names both holders. This is the
    /// documented collision policy, never an error.
    pub async fn replace_tickets(&self, records: Vec<Ticket>) {
        let mut tickets: HashMap<String, Ticket> = HashMap::with_capacity(records.len());
        for ticket in records {
            if let Some(previous) = tickets.insert(ticket.barcode.clone(), ticket) {
                let replacement = &tickets[&previous.barcode];
                tracing::warn!(
                    "A duplicate barcode {} was found and the record replaced! \
                     {} was replaced by {}.",
                    previous.barcode,
                    previous.full_name(),
                    replacement.full_name(),
                );
            }
        }
        *self.tickets.write().await = Arc::new(tickets);
    }

    /// Looks up a ticket by barcode in the current snapshot.
    pub async fn ticket_by_barcode(&self, barcode: &str) -> Option<Ticket> {
        self.tickets.read().await.get(barcode).cloned()
    }

    /// Number of tickets in the current snapshot.
    pub async fn ticket_count(&self) -> usize {
        self.tickets.read().await.len()
    }

    /// Replaces the set of barcodes known to belong to speakers.
    pub async fn replace_speaker_barcodes(&self, barcodes: HashSet<String>) {
        *self.speaker_barcodes.write().await = Arc::new(barcodes);
    }

    /// Checks whether the given barcode is of a ticket owned by a speaker.
    pub async fn is_speaker_barcode(&self, barcode: &str) -> bool {
        self.speaker_barcodes.read().await.contains(barcode)
    }

    /// Replaces the calendar event snapshot.
    pub async fn replace_events(&self, events: Vec<CalendarEvent>) {
        *self.events.write().await = Arc::new(events);
    }

    /// The current calendar event snapshot.
    pub async fn events(&self) -> Arc<Vec<CalendarEvent>> {
        self.events.read().await.clone()
    }

    /// All still-future events that have yet to be announced.
    ///
    /// With a lookahead, only events whose start time rounds to at most that
    /// many minutes away are included; without one, every pending future event
    /// is (the "list everything pending" mode). Events already started are
    /// never included. No ordering is guaranteed.
    pub async fn due_events(
        &self,
        now: DateTime<Utc>,
        lookahead_minutes: Option<i64>,
    ) -> Vec<CalendarEvent> {
        let events = self.events.read().await.clone();
        let announced = self.announced_events.read().await;

        events
            .iter()
            .filter(|event| !announced.contains(&event.name))
            .filter(|event| {
                let diff_seconds = (event.start - now).num_seconds();
                if diff_seconds <= 0 {
                    return false;
                }
                match lookahead_minutes {
                    Some(minutes) => {
                        let diff_minutes = (diff_seconds as f64 / 60.0).round() as i64;
                        diff_minutes <= minutes
                    }
                    None => true,
                }
            })
            .cloned()
            .collect()
    }

    /// Marks an event as announced, excluding it from future `due_events`
    /// results for the rest of the process lifetime.
    pub async fn mark_event_announced(&self, name: &str) {
        self.announced_events.write().await.insert(name.to_string());
    }

    /// Replaces the channel→broadcast snapshot produced by reconciliation.
    pub async fn replace_broadcast_channels(&self, map: ChannelBroadcastMap) {
        *self.broadcast_channels.write().await = Arc::new(map);
    }

    /// All channels whose broadcast starts in the future and has yet to be
    /// announced.
    ///
    /// Same shape as [`due_events`](Self::due_events) but keyed by channel
    /// identity and with the lookahead in seconds: live broadcasts need
    /// near-real-time triggering, so no rounding is applied.
    pub async fn due_broadcasts(
        &self,
        now: DateTime<Utc>,
        lookahead_seconds: Option<i64>,
    ) -> Vec<(ChannelId, Broadcast)> {
        let map = self.broadcast_channels.read().await.clone();
        let announced = self.announced_channels.read().await;

        map.iter()
            .filter(|(channel, _)| !announced.contains(channel))
            .filter(|(_, broadcast)| {
                let diff_seconds = (broadcast.start_time - now).num_seconds();
                diff_seconds > 0
                    && lookahead_seconds
                        .map(|seconds| diff_seconds <= seconds)
                        .unwrap_or(true)
            })
            .map(|(channel, broadcast)| (*channel, broadcast.clone()))
            .collect()
    }

    /// Marks a broadcast channel as announced.
    pub async fn mark_channel_announced(&self, channel: ChannelId) {
        self.announced_channels.write().await.insert(channel);
    }
}
