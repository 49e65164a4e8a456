//! Ticket registration flow.
//!
//! Decides what should happen for a `!register <barcode>` request from the
//! cached ticket snapshot and the durable registration log. The Discord side
//! effects (roles, nickname, replies) are applied by the bot handler from the
//! returned outcome.

use std::sync::Arc;

use crate::cache::CacheStore;
use crate::error::AppError;
use crate::model::Ticket;
use crate::provider::RegistrationStore;

/// Maximum nickname length on Discord.
const NICKNAME_MAX: usize = 32;

/// Result of evaluating a registration request.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// No ticket with the given barcode is in the current snapshot.
    UnknownBarcode,
    /// The ticket exists but is cancelled or otherwise not valid.
    InvalidTicket,
    /// The ticket was already registered by someone.
    AlreadyUsed,
    /// Registration may proceed.
    Registered {
        ticket: Ticket,
        /// The barcode belongs to a speaker; assign the speaker role too.
        speaker: bool,
        /// Nickname to set, truncated to Discord's limit.
        nickname: String,
        /// The full name did not fit and was cut.
        truncated: bool,
    },
}

pub struct RegistrationService {
    cache: Arc<CacheStore>,
    registry: Arc<dyn RegistrationStore>,
}

impl RegistrationService {
    pub fn new(cache: Arc<CacheStore>, registry: Arc<dyn RegistrationStore>) -> Self {
        Self { cache, registry }
    }

    /// Evaluates a registration request for the given barcode.
    ///
    /// # Returns
    /// - `Ok(RegistrationOutcome)` - What the caller should do
    /// - `Err(AppError)` - The registration log could not be consulted
    pub async fn evaluate(&self, barcode: &str) -> Result<RegistrationOutcome, AppError> {
        let Some(ticket) = self.cache.ticket_by_barcode(barcode).await else {
            return Ok(RegistrationOutcome::UnknownBarcode);
        };

        if !ticket.valid {
            return Ok(RegistrationOutcome::InvalidTicket);
        }

        if self.registry.is_ticket_used(barcode).await? {
            return Ok(RegistrationOutcome::AlreadyUsed);
        }

        let speaker = self.cache.is_speaker_barcode(barcode).await;
        let full_name = ticket.full_name();
        let nickname = truncate_nickname(&full_name);
        let truncated = nickname.chars().count() < full_name.chars().count();

        Ok(RegistrationOutcome::Registered {
            ticket,
            speaker,
            nickname,
            truncated,
        })
    }

    /// Records a completed registration in the durable log.
    pub async fn record(
        &self,
        ticket: &Ticket,
        member_name: &str,
        member_id: u64,
    ) -> Result<(), AppError> {
        self.registry
            .append_registration(ticket, member_name, member_id)
            .await
    }
}

fn truncate_nickname(full_name: &str) -> String {
    full_name.chars().take(NICKNAME_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serenity::async_trait;
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    /// In-memory registration log for tests.
    #[derive(Default)]
    struct MemoryRegistry {
        used: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl RegistrationStore for MemoryRegistry {
        async fn is_ticket_used(&self, barcode: &str) -> Result<bool, AppError> {
            Ok(self.used.lock().await.contains(barcode))
        }

        async fn append_registration(
            &self,
            ticket: &Ticket,
            _member_name: &str,
            _member_id: u64,
        ) -> Result<(), AppError> {
            self.used.lock().await.insert(ticket.barcode.clone());
            Ok(())
        }
    }

    fn ticket(barcode: &str, first_name: &str, surname: &str) -> Ticket {
        Ticket {
            barcode: barcode.to_string(),
            valid: true,
            first_name: first_name.to_string(),
            surname: surname.to_string(),
            ticket_type: "General".to_string(),
        }
    }

    async fn service_with(
        tickets: Vec<Ticket>,
        speakers: HashSet<String>,
    ) -> (RegistrationService, Arc<MemoryRegistry>) {
        let cache = Arc::new(CacheStore::new());
        cache.replace_tickets(tickets).await;
        cache.replace_speaker_barcodes(speakers).await;
        let registry = Arc::new(MemoryRegistry::default());
        (
            RegistrationService::new(cache, registry.clone()),
            registry,
        )
    }

    #[tokio::test]
    async fn unknown_barcode_is_rejected() {
        let (service, _) = service_with(Vec::new(), HashSet::new()).await;
        let outcome = service.evaluate("999").await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::UnknownBarcode));
    }

    #[tokio::test]
    async fn cancelled_ticket_is_rejected() {
        let mut cancelled = ticket("123", "Grace", "Hopper");
        cancelled.valid = false;
        let (service, _) = service_with(vec![cancelled], HashSet::new()).await;

        let outcome = service.evaluate("123").await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::InvalidTicket));
    }

    #[tokio::test]
    async fn used_ticket_is_rejected() {
        let (service, registry) =
            service_with(vec![ticket("123", "Grace", "Hopper")], HashSet::new()).await;
        registry.used.lock().await.insert("123".to_string());

        let outcome = service.evaluate("123").await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::AlreadyUsed));
    }

    #[tokio::test]
    async fn fresh_ticket_registers() {
        let (service, _) =
            service_with(vec![ticket("123", "Grace", "Hopper")], HashSet::new()).await;

        let outcome = service.evaluate("123").await.unwrap();
        match outcome {
            RegistrationOutcome::Registered {
                ticket,
                speaker,
                nickname,
                truncated,
            } => {
                assert_eq!(ticket.barcode, "123");
                assert!(!speaker);
                assert_eq!(nickname, "Grace Hopper");
                assert!(!truncated);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn speaker_barcode_is_flagged() {
        let (service, _) = service_with(
            vec![ticket("123", "Grace", "Hopper")],
            ["123".to_string()].into(),
        )
        .await;

        let outcome = service.evaluate("123").await.unwrap();
        assert!(matches!(
            outcome,
            RegistrationOutcome::Registered { speaker: true, .. }
        ));
    }

    #[tokio::test]
    async fn long_names_are_truncated() {
        let (service, _) = service_with(
            vec![ticket("123", "Maximiliana-Alexandrina", "Konstantinopolos")],
            HashSet::new(),
        )
        .await;

        let outcome = service.evaluate("123").await.unwrap();
        match outcome {
            RegistrationOutcome::Registered {
                nickname, truncated, ..
            } => {
                assert_eq!(nickname.chars().count(), 32);
                assert!(truncated);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn record_marks_ticket_used() {
        let (service, _) =
            service_with(vec![ticket("123", "Grace", "Hopper")], HashSet::new()).await;
        let ticket = service.cache.ticket_by_barcode("123").await.unwrap();

        service.record(&ticket, "grace", 42).await.unwrap();

        let outcome = service.evaluate("123").await.unwrap();
        assert!(matches!(outcome, RegistrationOutcome::AlreadyUsed));
    }
}
