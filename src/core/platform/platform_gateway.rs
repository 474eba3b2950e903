// The port through which the core talks to the messaging platform.
//
// The core only ever sees this trait. The Discord layer implements it on top
// of serenity's cache and HTTP client; tests use an in-memory fake.

use super::platform_models::{
    GuildStructure, GuildSummary, MemberBreakdown, MemberSummary, RestoreReport,
};
use async_trait::async_trait;
use thiserror::Error;

/// Platform failures. All of them are transient from the control plane's
/// point of view: they affect `bot_status` and get logged, nothing more.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Platform is not connected")]
    Unavailable,

    #[error("Guild {0} is not known to the bot")]
    UnknownGuild(u64),

    #[error("Platform request failed: {0}")]
    Request(String),
}

#[async_trait]
pub trait PlatformGateway: Send + Sync {
    /// Whether the gateway connection is currently up.
    fn is_connected(&self) -> bool;

    async fn guilds(&self) -> Result<Vec<GuildSummary>, PlatformError>;

    async fn member_breakdown(&self, guild_id: u64) -> Result<MemberBreakdown, PlatformError>;

    /// Up to `limit` members of a guild.
    async fn members(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<MemberSummary>, PlatformError>;

    async fn snapshot_structure(&self, guild_id: u64) -> Result<GuildStructure, PlatformError>;

    /// Deny (or stop denying) `@everyone` sending messages in every text channel.
    /// Returns how many channels were updated.
    async fn set_channels_locked(&self, guild_id: u64, locked: bool)
        -> Result<usize, PlatformError>;

    /// Recreate whatever roles, categories, channels and role assignments from
    /// `structure` are missing. Best effort: individual failures are skipped.
    async fn restore_structure(
        &self,
        guild_id: u64,
        structure: &GuildStructure,
    ) -> Result<RestoreReport, PlatformError>;
}
