//! Small shared helpers with no external dependencies of their own.

pub mod ics;
pub mod sanitize;
