use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    ///
    /// The application requires this environment variable to be defined. Check
    /// the documentation or `.env.example` file for required configuration
    /// variables.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable is set but could not be parsed.
    #[error("Invalid value '{value}' for environment variable {name}")]
    InvalidEnvVar {
        /// Name of the environment variable
        name: String,
        /// The value that failed to parse
        value: String,
    },

    /// A refresh or tick interval was configured as zero or negative.
    ///
    /// Every periodic task requires a strictly positive interval.
    #[error("Interval {name} must be strictly positive, got {value}")]
    NonPositiveInterval {
        /// Name of the environment variable
        name: String,
        /// The configured value
        value: i64,
    },

    /// The broadcast announcement tick is not shorter than the lookahead
    /// window.
    ///
    /// A broadcast starting between two ticks would never fall inside the
    /// window and would be skipped entirely, so this configuration is refused
    /// at startup.
    #[error(
        "Broadcast announcement tick ({tick_seconds}s) must be shorter than \
         the lookahead window ({lookahead_seconds}s)"
    )]
    TickNotShorterThanLookahead {
        /// Configured announcement tick in seconds
        tick_seconds: i64,
        /// Configured lookahead window in seconds
        lookahead_seconds: i64,
    },
}
