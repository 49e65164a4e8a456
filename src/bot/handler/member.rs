//! New member greeting.

use std::time::Duration;

use serenity::all::{Context, Member, Mentionable};

use crate::bot::server_info::ServerInfo;
use crate::config::Config;

/// Pause between the private greeting and the public welcome, giving the
/// member a moment to read their DM first.
const WELCOME_DELAY: Duration = Duration::from_secs(7);

/// Greets a newly joined member.
///
/// Sends registration instructions over DM, waits a moment, then welcomes
/// them publicly in the welcome channel. Every send is best-effort: members
/// with DMs disabled still get the public welcome.
pub async fn greet_new_member(ctx: &Context, member: &Member, config: &Config, info: &ServerInfo) {
    tracing::info!("Member {} joined", member.user.name);

    match member.user.create_dm_channel(&ctx.http).await {
        Ok(dm) => {
            let greeting = [
                format!(
                    "Hi {}, welcome to {}!",
                    member.user.name, config.event_name
                ),
                "To get access to the rest of the server, register with the \
                 barcode on your ticket: send `!register <barcode>` here or in \
                 any channel on the server."
                    .to_string(),
                format!(
                    "If you get stuck, ask for help in {}.",
                    info.help_desk_channel.mention()
                ),
            ];
            for line in greeting {
                if let Err(e) = dm.id.say(&ctx.http, line).await {
                    tracing::warn!("Failed to DM greeting to {}: {e}", member.user.name);
                    break;
                }
            }
        }
        Err(e) => {
            tracing::warn!("Failed to open DM channel to {}: {e}", member.user.name);
        }
    }

    tokio::time::sleep(WELCOME_DELAY).await;

    let welcome = format!(
        "Welcome to {}, {}!",
        config.event_name,
        member.user.mention()
    );
    if let Err(e) = info.welcome_channel.say(&ctx.http, welcome).await {
        tracing::warn!("Failed to post public welcome for {}: {e}", member.user.name);
    }
}
