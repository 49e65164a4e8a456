use thiserror::Error;

/// Internal issues with the codebase indicating unexpected behavior & possible bugs
#[derive(Error, Debug)]
pub enum InternalError {
    /// A role configured by name does not exist in the guild.
    ///
    /// Server info resolution requires every configured role to be present;
    /// a missing role means the guild is not set up for this bot.
    #[error("The role '{0}' was not found in the guild")]
    RoleNotFound(String),

    /// An ICS timestamp could not be parsed.
    #[error("Failed to parse ICS timestamp '{value}': {reason}")]
    InvalidIcsTimestamp {
        /// The raw DTSTART value
        value: String,
        /// The reason parsing failed
        reason: String,
    },
}
