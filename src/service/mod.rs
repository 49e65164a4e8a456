//! Services coordinating between the caches and the Discord API.

pub mod broadcast_channels;
pub mod notify;
pub mod registration;
