//! Discord gateway surface: client startup and event handlers.

pub mod handler;
pub mod server_info;
pub mod start;
