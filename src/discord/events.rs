// Gateway events that keep the platform adapter and the config store in
// step with Discord, and feed joins and structural changes to raid detection.

use crate::core::logging::LogKind;
use crate::core::protection::GuardEvent;
use crate::discord::moderation::message_handler;
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            data.gateway.attach(ctx);
            let activity = serenity::ActivityData::watching("for raids");
            ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);

            tracing::info!(user = %data_about_bot.user.name, "Connected to Discord");
            data.logs.record(
                LogKind::Success,
                None,
                format!("Bot connected as {}", data_about_bot.user.name),
            );
        }
        serenity::FullEvent::GuildCreate { guild, is_new } => {
            let guild_id = guild.id.get();
            match data.config.register(guild_id).await {
                Ok(true) => {
                    tracing::info!(guild_id, name = %guild.name, "Registered new guild");
                    data.logs.record(
                        LogKind::Info,
                        Some(guild_id),
                        format!("Joined server {}", guild.name),
                    );
                }
                Ok(false) => {
                    if is_new.unwrap_or(false) {
                        tracing::info!(guild_id, "Rejoined guild with existing configuration");
                    }
                }
                Err(e) => {
                    tracing::error!(guild_id, error = %e, "Failed to register guild");
                    data.logs.record(
                        LogKind::Error,
                        Some(guild_id),
                        format!("Could not register server {}", guild.name),
                    );
                }
            }
        }
        serenity::FullEvent::ShardStageUpdate { event } => {
            data.gateway
                .set_connected(event.new == serenity::ConnectionStage::Connected);
        }
        serenity::FullEvent::Resume { .. } => {
            data.gateway.set_connected(true);
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            observe(data, new_member.guild_id, GuardEvent::MemberJoin).await;
        }
        serenity::FullEvent::ChannelCreate { channel } => {
            observe(data, channel.guild_id, GuardEvent::ChannelCreate).await;
        }
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            observe(data, channel.guild_id, GuardEvent::ChannelDelete).await;
        }
        serenity::FullEvent::GuildRoleCreate { new } => {
            observe(data, new.guild_id, GuardEvent::RoleCreate).await;
        }
        serenity::FullEvent::GuildRoleDelete { guild_id, .. } => {
            observe(data, *guild_id, GuardEvent::RoleDelete).await;
        }
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = message_handler::handle_message(ctx, new_message, data).await {
                tracing::error!(error = %e, "Failed to screen message");
            }
        }
        _ => {}
    }
    Ok(())
}

/// Hand an event to raid detection. Failures are logged, never returned, so
/// one bad event can't stall the handler.
async fn observe(data: &Data, guild_id: serenity::GuildId, event: GuardEvent) {
    let guild_id = guild_id.get();
    match data.protection.observe(guild_id, event).await {
        Ok(Some(threat)) => tracing::info!(guild_id, %threat, "Raid mode raised automatically"),
        Ok(None) => {}
        Err(e) => {
            tracing::error!(guild_id, ?event, error = %e, "Raid detection failed");
            data.logs.record(
                LogKind::Error,
                Some(guild_id),
                format!("Automatic raid response failed: {}", e),
            );
        }
    }
}
