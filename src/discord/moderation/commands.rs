// Moderation slash commands. Thin wrappers around the moderation controller,
// so a command does exactly what the matching dashboard button does.

use crate::core::moderation::{ActionError, RaidAction};
use crate::discord::{Data, Error};

type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum RaidToggle {
    #[name = "on"]
    On,
    #[name = "off"]
    Off,
}

impl From<RaidToggle> for RaidAction {
    fn from(toggle: RaidToggle) -> Self {
        match toggle {
            RaidToggle::On => RaidAction::Enable,
            RaidToggle::Off => RaidAction::Disable,
        }
    }
}

/// Reply with the outcome. Input problems go back to the caller; anything
/// else is logged and reported generically.
async fn reply(ctx: Context<'_>, outcome: Result<String, ActionError>) -> Result<(), Error> {
    let text = match outcome {
        Ok(message) => format!("✅ {}", message),
        Err(e @ (ActionError::Validation { .. } | ActionError::NotFound(_))) => {
            format!("❌ {}", e)
        }
        Err(e) => {
            tracing::error!(command = %ctx.command().name, error = %e, "Moderation command failed");
            "❌ Operation failed. Check the dashboard logs for details.".to_string()
        }
    };
    ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
        .await?;
    Ok(())
}

/// Turn raid mode on or off. While on, @everyone can't send messages.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn raidmode(
    ctx: Context<'_>,
    #[description = "on or off"] state: RaidToggle,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.defer_ephemeral().await?;

    let outcome = ctx
        .data()
        .moderation
        .set_raid_mode(guild_id.get(), state.into())
        .await;
    reply(ctx, outcome).await
}

/// Lock every text channel for a number of minutes.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn lockdown(
    ctx: Context<'_>,
    #[description = "Duration in minutes (defaults to the server setting)"]
    #[min = 1]
    minutes: Option<i64>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.defer_ephemeral().await?;

    let outcome = ctx
        .data()
        .moderation
        .trigger_lockdown(guild_id.get(), minutes)
        .await;
    reply(ctx, outcome).await
}

/// End the current lockdown early.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn lockdown_cancel(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.defer_ephemeral().await?;

    let outcome = ctx.data().moderation.cancel_lockdown(guild_id.get()).await;
    reply(ctx, outcome).await
}

/// Save this server's roles, channels and settings.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn backup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.defer_ephemeral().await?;

    let outcome = ctx.data().moderation.backup(guild_id.get()).await;
    reply(ctx, outcome).await
}

/// Put back whatever the latest backup has that the server is missing.
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn restore(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    ctx.defer_ephemeral().await?;

    let outcome = ctx.data().moderation.restore(guild_id.get()).await;
    reply(ctx, outcome).await
}

/// Every command this module registers.
pub fn all() -> Vec<poise::Command<Data, Error>> {
    vec![raidmode(), lockdown(), lockdown_cancel(), backup(), restore()]
}
