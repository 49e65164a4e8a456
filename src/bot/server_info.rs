//! Guild handles resolved once per process.

use serenity::all::{ChannelId, GuildId, RoleId};
use serenity::http::Http;

use crate::config::DiscordConfig;
use crate::error::{internal::InternalError, AppError};

/// Guild, role and channel handles the handlers need, retrieved from Discord
/// only once and cached for the rest of the process lifetime.
pub struct ServerInfo {
    pub guild_id: GuildId,
    pub attendee_role: RoleId,
    pub speaker_role: RoleId,
    pub help_desk_channel: ChannelId,
    pub welcome_channel: ChannelId,
    pub log_channel: ChannelId,
}

impl ServerInfo {
    /// Resolves the configured role names against the guild.
    ///
    /// # Returns
    /// - `Ok(ServerInfo)` - All configured roles exist
    /// - `Err(AppError)` - A role is missing or the guild is unreachable
    pub async fn resolve(http: &Http, config: &DiscordConfig) -> Result<Self, AppError> {
        let guild_id = GuildId::new(config.guild_id);
        let roles = http.get_guild_roles(guild_id).await?;

        let role_by_name = |name: &str| -> Result<RoleId, InternalError> {
            roles
                .iter()
                .find(|role| role.name == name)
                .map(|role| role.id)
                .ok_or_else(|| InternalError::RoleNotFound(name.to_string()))
        };

        Ok(Self {
            guild_id,
            attendee_role: role_by_name(&config.attendee_role)?,
            speaker_role: role_by_name(&config.speaker_role)?,
            help_desk_channel: ChannelId::new(config.help_desk_channel_id),
            welcome_channel: ChannelId::new(config.welcome_channel_id),
            log_channel: ChannelId::new(config.log_channel_id),
        })
    }
}
