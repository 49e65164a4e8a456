//! Typed clients for the external data services.
//!
//! Each data source sits behind a trait so the refresh scheduler and the
//! registration flow consume an interface; the reqwest implementations live in
//! the submodules. Retries are not handled here: a failed fetch surfaces as an
//! error and the owning refresh cycle keeps its stale snapshot until the next
//! tick.

pub mod quicket;
pub mod sheets;
pub mod wafer;
pub mod youtube;

use std::collections::HashSet;

use serde::Deserialize;
use serenity::async_trait;

use crate::error::AppError;
use crate::model::{Broadcast, CalendarEvent, Ticket};

/// Source of the paid-ticket records.
#[async_trait]
pub trait TicketProvider: Send + Sync {
    async fn fetch_tickets(&self) -> Result<Vec<Ticket>, AppError>;
}

/// Source of the barcodes owned by speakers.
#[async_trait]
pub trait SpeakerProvider: Send + Sync {
    async fn fetch_speaker_barcodes(&self) -> Result<HashSet<String>, AppError>;
}

/// Source of the published conference schedule.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn fetch_events(&self) -> Result<Vec<CalendarEvent>, AppError>;
}

/// Source of the live broadcast listing, ordered by start time.
#[async_trait]
pub trait BroadcastProvider: Send + Sync {
    async fn fetch_broadcasts(&self) -> Result<Vec<Broadcast>, AppError>;
}

/// Durable registration log, keyed by ticket barcode.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Whether the given barcode was already registered.
    async fn is_ticket_used(&self, barcode: &str) -> Result<bool, AppError>;

    /// Appends a completed registration.
    async fn append_registration(
        &self,
        ticket: &Ticket,
        member_name: &str,
        member_id: u64,
    ) -> Result<(), AppError>;
}

/// A JSON field that the remote may serialize as a string, number or boolean.
///
/// The ticketing payloads are not strict about scalar types (barcodes arrive
/// as numbers or strings depending on the export), so scalar fields are read
/// through this and normalized.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum FieldValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl FieldValue {
    pub(crate) fn as_string(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Flag(b) => b.to_string(),
        }
    }

    pub(crate) fn as_flag(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Number(n) => *n != 0,
            FieldValue::Text(s) => {
                !s.is_empty() && s != "0" && !s.eq_ignore_ascii_case("false")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_normalizes_scalars() {
        let barcode: FieldValue = serde_json::from_str("4276660").unwrap();
        assert_eq!(barcode.as_string(), "4276660");

        let barcode: FieldValue = serde_json::from_str("\"4276660\"").unwrap();
        assert_eq!(barcode.as_string(), "4276660");

        let valid: FieldValue = serde_json::from_str("true").unwrap();
        assert!(valid.as_flag());

        let valid: FieldValue = serde_json::from_str("\"False\"").unwrap();
        assert!(!valid.as_flag());

        let valid: FieldValue = serde_json::from_str("0").unwrap();
        assert!(!valid.as_flag());
    }
}
