//! The `!register` command.

use std::sync::Arc;

use serenity::all::{Context, EditMember, Mentionable, Message};

use crate::bot::server_info::ServerInfo;
use crate::config::Config;
use crate::service::notify::{DiscordNotifier, Logbook};
use crate::service::registration::{RegistrationOutcome, RegistrationService};

pub const REGISTER_COMMAND: &str = "!register";

/// Extracts the barcode argument from a `!register` message.
///
/// # Returns
/// - `Some(barcode)` - The message is a register command; the barcode may be
///   empty when no argument was given
/// - `None` - The message is not a register command
pub fn parse_register(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(REGISTER_COMMAND)?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        // Some other word starting with "!register".
        return None;
    }
    Some(rest.trim())
}

/// Handles a registration request end to end.
///
/// Evaluates the barcode against the ticket snapshot and the registration
/// log, then applies the Discord side: the attendee role, the real-name
/// nickname, the speaker role where the barcode is a speaker's, and a durable
/// record of the registration. Replies go to wherever the command was sent,
/// DMs included.
pub async fn handle_registration(
    ctx: &Context,
    msg: &Message,
    barcode: &str,
    service: &RegistrationService,
    config: &Config,
    info: &ServerInfo,
) {
    let reply = |text: String| async move {
        if let Err(e) = msg.channel_id.say(&ctx.http, text).await {
            tracing::warn!("Failed to reply to registration request: {e}");
        }
    };

    if barcode.is_empty() {
        reply(format!("Usage: `{REGISTER_COMMAND} <ticket barcode>`")).await;
        return;
    }

    // The command works from DMs too, so the member is looked up rather than
    // taken from the message.
    let member = match info.guild_id.member(&ctx.http, msg.author.id).await {
        Ok(member) => member,
        Err(e) => {
            tracing::warn!(
                "Registration from {} who is not a guild member: {e}",
                msg.author.name
            );
            reply(format!(
                "You don't seem to be a member of the {} server yet. Join the \
                 server first, then register.",
                config.event_name
            ))
            .await;
            return;
        }
    };

    let outcome = match service.evaluate(barcode).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Failed to evaluate registration for barcode {barcode}: {e}");
            reply(format!(
                "Something went wrong checking your ticket. Please try again \
                 in a minute, or ask for help in {}.",
                info.help_desk_channel.mention()
            ))
            .await;
            return;
        }
    };

    let (ticket, speaker, nickname, truncated) = match outcome {
        RegistrationOutcome::UnknownBarcode => {
            reply(format!(
                "Sorry, I don't recognise that ticket number. Please check the \
                 barcode on your ticket and try again, or ask for help in {}.",
                info.help_desk_channel.mention()
            ))
            .await;
            return;
        }
        RegistrationOutcome::InvalidTicket => {
            reply(format!(
                "That ticket appears to be cancelled or invalid. Please ask a \
                 {} for help in {}.",
                config.discord.registration_role,
                info.help_desk_channel.mention()
            ))
            .await;
            return;
        }
        RegistrationOutcome::AlreadyUsed => {
            reply(format!(
                "That ticket has already been used to register. If that is \
                 unexpected, please ask a {} for help in {}.",
                config.discord.registration_role,
                info.help_desk_channel.mention()
            ))
            .await;
            return;
        }
        RegistrationOutcome::Registered {
            ticket,
            speaker,
            nickname,
            truncated,
        } => (ticket, speaker, nickname, truncated),
    };

    let logbook = Logbook::new(
        Arc::new(DiscordNotifier::new(ctx.http.clone())),
        info.log_channel,
    );

    if let Err(e) = member.add_role(&ctx.http, info.attendee_role).await {
        tracing::error!("Failed to assign attendee role to {}: {e}", msg.author.name);
        reply(format!(
            "Something went wrong assigning your role. Please ask a {} for help.",
            config.discord.registration_role
        ))
        .await;
        return;
    }

    // Server owners and higher-ranked members cannot be renamed by the bot,
    // so a nickname failure is not treated as a failed registration.
    if let Err(e) = info
        .guild_id
        .edit_member(
            &ctx.http,
            msg.author.id,
            EditMember::new().nickname(&nickname),
        )
        .await
    {
        tracing::warn!("Failed to set nickname for {}: {e}", msg.author.name);
    } else if truncated {
        reply(format!(
            "Your name was too long for a Discord nickname, so I shortened it \
             to **{nickname}**."
        ))
        .await;
    }

    if speaker {
        if let Err(e) = member.add_role(&ctx.http, info.speaker_role).await {
            tracing::error!("Failed to assign speaker role to {}: {e}", msg.author.name);
        }
    }

    reply(format!(
        "Thanks {}, you are now registered for {}! Enjoy the conference.",
        ticket.first_name, config.event_name
    ))
    .await;

    logbook
        .record(&format!(
            "Registered {} ({}, barcode {}) as {}{}",
            ticket.full_name(),
            ticket.ticket_type,
            ticket.barcode,
            msg.author.name,
            if speaker { " [speaker]" } else { "" }
        ))
        .await;

    if let Err(e) = service.record(&ticket, &msg.author.name, msg.author.id.get()).await {
        tracing::error!(
            "Failed to record registration of barcode {} in the log: {e}",
            ticket.barcode
        );
        logbook
            .record(&format!(
                "WARNING: registration of barcode {} was applied but could not \
                 be recorded in the registration sheet.",
                ticket.barcode
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_barcode_argument() {
        assert_eq!(parse_register("!register 12345"), Some("12345"));
        assert_eq!(parse_register("!register   12345  "), Some("12345"));
    }

    #[test]
    fn bare_command_yields_empty_barcode() {
        assert_eq!(parse_register("!register"), Some(""));
        assert_eq!(parse_register("!register   "), Some(""));
    }

    #[test]
    fn other_messages_are_ignored() {
        assert_eq!(parse_register("hello there"), None);
        assert_eq!(parse_register("!registered voters"), None);
        assert_eq!(parse_register("register 12345"), None);
    }
}
