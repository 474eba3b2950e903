// Screens guild messages and removes the ones that break the guild's limits.

use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Check a message and delete it if it breaks a limit.
///
/// Returns `true` if the message was removed.
pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<bool, Error> {
    // Bots and webhooks are handled by the anti-nuke side, not here.
    if msg.author.bot || msg.webhook_id.is_some() {
        return Ok(false);
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(false);
    };

    let mentions = (msg.mentions.len() + msg.mention_roles.len()) as u32
        + u32::from(msg.mention_everyone);
    let violation = data
        .protection
        .screen_message(guild_id.get(), msg.author.id.get(), &msg.content, mentions)
        .await?;

    let Some(violation) = violation else {
        return Ok(false);
    };
    if let Err(e) = msg.delete(&ctx.http).await {
        tracing::warn!(guild_id = guild_id.get(), error = %e, "Failed to delete blocked message");
        return Ok(false);
    }
    let notice = format!("⚠️ <@{}> your message was removed: {}.", msg.author.id, violation);
    if let Err(e) = msg.channel_id.say(&ctx.http, notice).await {
        tracing::warn!("Failed to send removal notice: {}", e);
    }
    Ok(true)
}
