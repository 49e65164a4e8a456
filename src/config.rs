use crate::error::{config::ConfigError, AppError};

/// How often the event announcement loop runs, in seconds.
///
/// Fixed rather than configured: the events lookahead is minutes-granularity,
/// so a 30 second tick is always comfortably inside the window.
pub const EVENT_ANNOUNCE_TICK_SECONDS: u64 = 30;

/// Discord server identity and channel/role configuration.
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: u64,
    pub log_channel_id: u64,
    pub welcome_channel_id: u64,
    pub announcement_channel_id: u64,
    pub help_desk_channel_id: u64,
    pub attendee_role: String,
    pub registration_role: String,
    pub speaker_role: String,
}

/// Quicket ticketing provider configuration.
pub struct QuicketConfig {
    pub api_key: String,
    pub user_token: String,
    pub event_id: u64,
    pub cache_expire_minutes: i64,
}

/// Wafer talk/schedule provider configuration.
pub struct WaferConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub talks_endpoint: String,
    pub tickets_endpoint: String,
    pub ics_endpoint: String,
    pub cache_expire_minutes: i64,
    /// How many minutes ahead of its start an event is announced.
    pub announce_boundary_minutes: i64,
}

/// YouTube live broadcast configuration.
pub struct YouTubeConfig {
    /// Pre-acquired OAuth bearer token; acquisition happens outside this bot.
    pub oauth_token: String,
    pub playlist_id: String,
    /// Discord category that holds one text channel per broadcast.
    pub category_id: u64,
    pub channel_sync_minutes: i64,
    pub announce_lookahead_seconds: i64,
    pub announce_tick_seconds: i64,
}

/// Google Sheets registration log configuration.
pub struct SheetsConfig {
    pub oauth_token: String,
    pub sheet_id: String,
    pub worksheet: String,
}

/// Feature toggles for each sync/command surface. Absent variables disable.
pub struct Features {
    pub registration: bool,
    pub quicket_sync: bool,
    pub wafer_sync: bool,
    pub youtube_sync: bool,
}

pub struct Config {
    pub event_name: String,
    pub discord: DiscordConfig,
    pub quicket: QuicketConfig,
    pub wafer: WaferConfig,
    pub youtube: YouTubeConfig,
    pub sheets: SheetsConfig,
    pub features: Features,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let config = Self {
            event_name: require("EVENT_NAME")?,
            discord: DiscordConfig {
                token: require("DISCORD_TOKEN")?,
                guild_id: require_parsed("DISCORD_GUILD_ID")?,
                log_channel_id: require_parsed("DISCORD_LOG_CHANNEL_ID")?,
                welcome_channel_id: require_parsed("DISCORD_WELCOME_CHANNEL_ID")?,
                announcement_channel_id: require_parsed("DISCORD_ANNOUNCEMENT_CHANNEL_ID")?,
                help_desk_channel_id: require_parsed("DISCORD_HELPDESK_CHANNEL_ID")?,
                attendee_role: require("DISCORD_REGISTERED_ROLE_NAME")?,
                registration_role: require("DISCORD_REGISTRATION_ROLE")?,
                speaker_role: require("DISCORD_SPEAKER_ROLE")?,
            },
            quicket: QuicketConfig {
                api_key: require("QUICKET_API_KEY")?,
                user_token: require("QUICKET_USER_TOKEN")?,
                event_id: require_parsed("QUICKET_EVENT_ID")?,
                cache_expire_minutes: require_parsed("QUICKET_CACHE_EXPIRE_MINUTES")?,
            },
            wafer: WaferConfig {
                base_url: require("WAFER_BASE_URL")?,
                username: require("WAFER_USERNAME")?,
                password: require("WAFER_PASSWORD")?,
                talks_endpoint: require("WAFER_TALKS_ENDPOINT")?,
                tickets_endpoint: require("WAFER_TICKETS_ENDPOINT")?,
                ics_endpoint: require("WAFER_ICS_ENDPOINT")?,
                cache_expire_minutes: require_parsed("WAFER_CACHE_EXPIRE_MINUTES")?,
                announce_boundary_minutes: require_parsed("WAFER_ANNOUNCE_BOUNDARY_MINUTES")?,
            },
            youtube: YouTubeConfig {
                oauth_token: require("YOUTUBE_OAUTH_TOKEN")?,
                playlist_id: require("YOUTUBE_PLAYLIST")?,
                category_id: require_parsed("YOUTUBE_CATEGORY_ID")?,
                channel_sync_minutes: require_parsed("YOUTUBE_CHANNEL_SYNC_MINUTES")?,
                announce_lookahead_seconds: require_parsed("YOUTUBE_ANNOUNCE_LOOKAHEAD_SECONDS")?,
                announce_tick_seconds: require_parsed("YOUTUBE_ANNOUNCE_TICK_SECONDS")?,
            },
            sheets: SheetsConfig {
                oauth_token: require("GOOGLE_OAUTH_TOKEN")?,
                sheet_id: require("GOOGLE_SHEET_ID")?,
                worksheet: require("GOOGLE_SHEET_WORKSHEET_NAME")?,
            },
            features: Features {
                registration: toggle("FEATURE_REGISTRATION")?,
                quicket_sync: toggle("FEATURE_QUICKET_SYNC")?,
                wafer_sync: toggle("FEATURE_WAFER_SYNC")?,
                youtube_sync: toggle("FEATURE_YOUTUBE_SYNC")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks the interval invariants that make the schedulers sound.
    ///
    /// # Returns
    /// - `Ok(())` - All intervals are usable
    /// - `Err(ConfigError)` - An interval is non-positive, or the broadcast
    ///   announcement tick is not shorter than its lookahead window
    fn validate(&self) -> Result<(), ConfigError> {
        positive(
            "QUICKET_CACHE_EXPIRE_MINUTES",
            self.quicket.cache_expire_minutes,
        )?;
        positive("WAFER_CACHE_EXPIRE_MINUTES", self.wafer.cache_expire_minutes)?;
        positive(
            "WAFER_ANNOUNCE_BOUNDARY_MINUTES",
            self.wafer.announce_boundary_minutes,
        )?;
        positive(
            "YOUTUBE_CHANNEL_SYNC_MINUTES",
            self.youtube.channel_sync_minutes,
        )?;
        positive(
            "YOUTUBE_ANNOUNCE_LOOKAHEAD_SECONDS",
            self.youtube.announce_lookahead_seconds,
        )?;
        positive(
            "YOUTUBE_ANNOUNCE_TICK_SECONDS",
            self.youtube.announce_tick_seconds,
        )?;
        check_tick_within_lookahead(
            self.youtube.announce_tick_seconds,
            self.youtube.announce_lookahead_seconds,
        )
    }
}

/// Requires the broadcast announcement tick to be strictly shorter than the
/// lookahead window.
///
/// A broadcast whose start time falls between two ticks is only caught if the
/// window spans at least one full tick; an equal or longer tick could skip it
/// entirely.
pub fn check_tick_within_lookahead(
    tick_seconds: i64,
    lookahead_seconds: i64,
) -> Result<(), ConfigError> {
    if tick_seconds >= lookahead_seconds {
        return Err(ConfigError::TickNotShorterThanLookahead {
            tick_seconds,
            lookahead_seconds,
        });
    }
    Ok(())
}

fn positive(name: &str, value: i64) -> Result<(), ConfigError> {
    if value <= 0 {
        return Err(ConfigError::NonPositiveInterval {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn require_parsed<T: std::str::FromStr>(name: &str) -> Result<T, ConfigError> {
    let value = require(name)?;
    value.parse().map_err(|_| ConfigError::InvalidEnvVar {
        name: name.to_string(),
        value,
    })
}

/// Reads a boolean feature toggle. An unset variable disables the feature.
fn toggle(name: &str) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(false),
        Ok(value) => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            _ => Err(ConfigError::InvalidEnvVar {
                name: name.to_string(),
                value,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_tick_equal_to_lookahead() {
        let result = check_tick_within_lookahead(60, 60);
        assert!(matches!(
            result,
            Err(ConfigError::TickNotShorterThanLookahead {
                tick_seconds: 60,
                lookahead_seconds: 60,
            })
        ));
    }

    #[test]
    fn rejects_tick_longer_than_lookahead() {
        assert!(check_tick_within_lookahead(120, 60).is_err());
    }

    #[test]
    fn accepts_tick_shorter_than_lookahead() {
        assert!(check_tick_within_lookahead(30, 120).is_ok());
    }

    #[test]
    fn rejects_non_positive_interval() {
        assert!(positive("TEST_INTERVAL", 0).is_err());
        assert!(positive("TEST_INTERVAL", -5).is_err());
        assert!(positive("TEST_INTERVAL", 1).is_ok());
    }
}
