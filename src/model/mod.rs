//! Domain models for the cached external records.

pub mod broadcast;
pub mod event;
pub mod ticket;

pub use broadcast::Broadcast;
pub use event::CalendarEvent;
pub use ticket::Ticket;
