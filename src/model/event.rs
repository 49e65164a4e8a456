use chrono::{DateTime, Utc};

/// A scheduled conference event from the published calendar.
///
/// The name doubles as the announcement identity: two events must not share a
/// name or the announced-set de-duplication will collapse them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub name: String,
    pub start: DateTime<Utc>,
    /// Free-form label from the calendar entry (usually the venue/track).
    pub location: String,
}
