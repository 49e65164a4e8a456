//! Refresh cycles: fetch a full snapshot, then replace the cache.
//!
//! The replace happens only after a fully successful fetch, so any provider
//! error leaves the previous snapshot untouched for readers.

use crate::cache::CacheStore;
use crate::error::AppError;
use crate::provider::{BroadcastProvider, CalendarProvider, SpeakerProvider, TicketProvider};
use crate::service::broadcast_channels::BroadcastChannelSync;

/// One ticket refresh cycle.
pub async fn refresh_tickets(
    provider: &dyn TicketProvider,
    cache: &CacheStore,
) -> Result<(), AppError> {
    let tickets = provider.fetch_tickets().await?;
    let count = tickets.len();
    cache.replace_tickets(tickets).await;
    tracing::debug!("Ticket snapshot replaced with {count} records");
    Ok(())
}

/// One speaker-barcode refresh cycle.
pub async fn refresh_speakers(
    provider: &dyn SpeakerProvider,
    cache: &CacheStore,
) -> Result<(), AppError> {
    let barcodes = provider.fetch_speaker_barcodes().await?;
    let count = barcodes.len();
    cache.replace_speaker_barcodes(barcodes).await;
    tracing::debug!("Speaker snapshot replaced with {count} barcodes");
    Ok(())
}

/// One calendar refresh cycle.
pub async fn refresh_calendar(
    provider: &dyn CalendarProvider,
    cache: &CacheStore,
) -> Result<(), AppError> {
    let events = provider.fetch_events().await?;
    let count = events.len();
    cache.replace_events(events).await;
    tracing::debug!("Calendar snapshot replaced with {count} events");
    Ok(())
}

/// One broadcast channel reconciliation cycle.
///
/// Fetches the broadcast listing, reconciles the channel category against it
/// and replaces the channel→broadcast snapshot with the result.
pub async fn refresh_broadcast_channels(
    provider: &dyn BroadcastProvider,
    sync: &BroadcastChannelSync,
    cache: &CacheStore,
) -> Result<(), AppError> {
    let broadcasts = provider.fetch_broadcasts().await?;
    let map = sync.reconcile(&broadcasts).await?;
    let count = map.len();
    cache.replace_broadcast_channels(map).await;
    tracing::debug!("Broadcast channel snapshot replaced with {count} mappings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CalendarEvent, Ticket};
    use chrono::Utc;
    use serenity::async_trait;
    use std::collections::HashSet;

    struct FailingProvider;

    #[async_trait]
    impl TicketProvider for FailingProvider {
        async fn fetch_tickets(&self) -> Result<Vec<Ticket>, AppError> {
            Err(AppError::NotFound("provider down".to_string()))
        }
    }

    #[async_trait]
    impl CalendarProvider for FailingProvider {
        async fn fetch_events(&self) -> Result<Vec<CalendarEvent>, AppError> {
            Err(AppError::NotFound("provider down".to_string()))
        }
    }

    #[async_trait]
    impl SpeakerProvider for FailingProvider {
        async fn fetch_speaker_barcodes(&self) -> Result<HashSet<String>, AppError> {
            Err(AppError::NotFound("provider down".to_string()))
        }
    }

    struct FixedTickets(Vec<Ticket>);

    #[async_trait]
    impl TicketProvider for FixedTickets {
        async fn fetch_tickets(&self) -> Result<Vec<Ticket>, AppError> {
            Ok(self.0.clone())
        }
    }

    fn ticket(barcode: &str) -> Ticket {
        Ticket {
            barcode: barcode.to_string(),
            valid: true,
            first_name: "Grace".to_string(),
            surname: "Hopper".to_string(),
            ticket_type: "General".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_fetch_replaces_snapshot() {
        let cache = CacheStore::new();
        let provider = FixedTickets(vec![ticket("1")]);

        refresh_tickets(&provider, &cache).await.unwrap();
        assert!(cache.ticket_by_barcode("1").await.is_some());

        let provider = FixedTickets(vec![ticket("2")]);
        refresh_tickets(&provider, &cache).await.unwrap();
        assert!(cache.ticket_by_barcode("1").await.is_none());
        assert!(cache.ticket_by_barcode("2").await.is_some());
    }

    #[tokio::test]
    async fn failed_fetch_keeps_stale_snapshot() {
        let cache = CacheStore::new();
        refresh_tickets(&FixedTickets(vec![ticket("1")]), &cache)
            .await
            .unwrap();

        let result = refresh_tickets(&FailingProvider, &cache).await;
        assert!(result.is_err());

        // The cycle before and after the failure read identically.
        assert!(cache.ticket_by_barcode("1").await.is_some());
        assert_eq!(cache.ticket_count().await, 1);
    }

    #[tokio::test]
    async fn failed_calendar_fetch_keeps_events() {
        let cache = CacheStore::new();
        cache
            .replace_events(vec![CalendarEvent {
                name: "Keynote".to_string(),
                start: Utc::now(),
                location: String::new(),
            }])
            .await;

        assert!(refresh_calendar(&FailingProvider, &cache).await.is_err());
        assert_eq!(cache.events().await.len(), 1);
    }

    #[tokio::test]
    async fn failed_speaker_fetch_keeps_set() {
        let cache = CacheStore::new();
        cache
            .replace_speaker_barcodes(["123".to_string()].into())
            .await;

        assert!(refresh_speakers(&FailingProvider, &cache).await.is_err());
        assert!(cache.is_speaker_barcode("123").await);
    }
}
