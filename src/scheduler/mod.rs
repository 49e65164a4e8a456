//! Periodic task scheduling.
//!
//! Every sync and announcement loop runs as its own spawned task around a
//! `tokio::time::interval`. The loop body is awaited to completion before the
//! next tick is taken, so a cycle never overlaps itself; separate cycles
//! interleave only at await points. A failed cycle is logged and simply retried
//! at its next natural tick. There is no backoff: stale data persists until the
//! provider recovers.

pub mod announce;
pub mod refresh;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serenity::all::ChannelId;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::cache::CacheStore;
use crate::config::{Config, EVENT_ANNOUNCE_TICK_SECONDS};
use crate::error::AppError;
use crate::provider::{BroadcastProvider, CalendarProvider, SpeakerProvider, TicketProvider};
use crate::service::broadcast_channels::{BroadcastChannelSync, ChannelGateway};
use crate::service::notify::{Logbook, Notifier};

use announce::Announcer;

/// The provider clients the refresh cycles read from.
pub struct Providers {
    pub tickets: Arc<dyn TicketProvider>,
    pub speakers: Arc<dyn SpeakerProvider>,
    pub calendar: Arc<dyn CalendarProvider>,
    pub broadcasts: Arc<dyn BroadcastProvider>,
}

/// Spawns a periodic task that runs `cycle` forever at the given period.
///
/// The first run happens immediately. Cycle errors are logged, never fatal.
fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut cycle: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), AppError>> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = cycle().await {
                tracing::error!("{name} cycle failed: {e}");
            }
        }
    });
}

/// Waits for the bot's gateway session, then spawns every enabled periodic
/// task.
///
/// Nothing fetches before the ready signal: guild and identity data are not
/// available until then, and the remote calls would be wasted.
///
/// # Arguments
/// - `config` - Validated application configuration
/// - `cache` - The shared cache store
/// - `providers` - External data provider clients
/// - `notifier` - Outbound announcement channel
/// - `gateway` - Channel-management operations for reconciliation
/// - `ready` - Readiness signal flipped by the bot's ready handler
pub async fn start(
    config: Arc<Config>,
    cache: Arc<CacheStore>,
    providers: Providers,
    notifier: Arc<dyn Notifier>,
    gateway: Arc<dyn ChannelGateway>,
    mut ready: watch::Receiver<bool>,
) -> Result<(), AppError> {
    while !*ready.borrow() {
        if ready.changed().await.is_err() {
            // The bot shut down before ever becoming ready.
            return Ok(());
        }
    }
    tracing::info!("Gateway session established; starting periodic tasks");

    let logbook = Arc::new(Logbook::new(
        notifier.clone(),
        ChannelId::new(config.discord.log_channel_id),
    ));
    let announcer = Arc::new(Announcer::new(cache.clone(), notifier));

    if config.features.quicket_sync {
        let provider = providers.tickets;
        let cache = cache.clone();
        let logbook = logbook.clone();
        spawn_periodic(
            "ticket sync",
            minutes(config.quicket.cache_expire_minutes),
            move || {
                let provider = provider.clone();
                let cache = cache.clone();
                let logbook = logbook.clone();
                async move {
                    logbook.record("Refreshing ticket cache...").await;
                    refresh::refresh_tickets(provider.as_ref(), &cache).await?;
                    logbook
                        .record(&format!(
                            "Ticket cache refreshed with {} tickets.",
                            cache.ticket_count().await
                        ))
                        .await;
                    Ok(())
                }
            },
        );
    }

    if config.features.wafer_sync {
        let provider = providers.speakers;
        let speaker_cache = cache.clone();
        let logbook_speakers = logbook.clone();
        spawn_periodic(
            "speaker sync",
            minutes(config.wafer.cache_expire_minutes),
            move || {
                let provider = provider.clone();
                let cache = speaker_cache.clone();
                let logbook = logbook_speakers.clone();
                async move {
                    logbook.record("Refreshing speakers cache...").await;
                    refresh::refresh_speakers(provider.as_ref(), &cache).await?;
                    logbook.record("Speakers cache refreshed.").await;
                    Ok(())
                }
            },
        );

        let provider = providers.calendar;
        let calendar_cache = cache.clone();
        let logbook_calendar = logbook.clone();
        spawn_periodic(
            "calendar sync",
            minutes(config.wafer.cache_expire_minutes),
            move || {
                let provider = provider.clone();
                let cache = calendar_cache.clone();
                let logbook = logbook_calendar.clone();
                async move {
                    logbook.record("Refreshing events cache...").await;
                    refresh::refresh_calendar(provider.as_ref(), &cache).await?;
                    logbook
                        .record(&format!(
                            "Events cache refreshed with {} events.",
                            cache.events().await.len()
                        ))
                        .await;
                    Ok(())
                }
            },
        );

        let announcer = announcer.clone();
        let channel = ChannelId::new(config.discord.announcement_channel_id);
        let lookahead_minutes = config.wafer.announce_boundary_minutes;
        spawn_periodic(
            "event announcements",
            Duration::from_secs(EVENT_ANNOUNCE_TICK_SECONDS),
            move || {
                let announcer = announcer.clone();
                async move {
                    announcer
                        .announce_due_events(Utc::now(), channel, lookahead_minutes)
                        .await;
                    Ok(())
                }
            },
        );
    }

    if config.features.youtube_sync {
        let provider = providers.broadcasts;
        let sync = Arc::new(BroadcastChannelSync::new(gateway));
        let reconcile_cache = cache.clone();
        spawn_periodic(
            "broadcast channel sync",
            minutes(config.youtube.channel_sync_minutes),
            move || {
                let provider = provider.clone();
                let sync = sync.clone();
                let cache = reconcile_cache.clone();
                async move {
                    refresh::refresh_broadcast_channels(provider.as_ref(), &sync, &cache).await
                }
            },
        );

        let lookahead_seconds = config.youtube.announce_lookahead_seconds;
        spawn_periodic(
            "broadcast announcements",
            Duration::from_secs(config.youtube.announce_tick_seconds as u64),
            move || {
                let announcer = announcer.clone();
                async move {
                    announcer
                        .announce_due_broadcasts(Utc::now(), lookahead_seconds)
                        .await;
                    Ok(())
                }
            },
        );
    }

    Ok(())
}

fn minutes(count: i64) -> Duration {
    Duration::from_secs(count as u64 * 60)
}
