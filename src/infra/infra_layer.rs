// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "sqlite.rs"]
pub mod sqlite;

#[path = "guild_config/mod.rs"]
pub mod guild_config;

#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::guild_config::GuildConfigService;
use crate::core::moderation::ModerationService;
use crate::core::protection::ProtectionService;

/// The config service as wired in production.
pub type ConfigService = GuildConfigService<guild_config::SqliteGuildConfigStore>;

/// The moderation controller as wired in production.
pub type ModerationControl = ModerationService<
    guild_config::SqliteGuildConfigStore,
    moderation::SqliteBackupStore,
    moderation::SqliteModerationStore,
>;

/// Automatic raid detection as wired in production.
pub type ProtectionControl = ProtectionService<
    guild_config::SqliteGuildConfigStore,
    moderation::SqliteBackupStore,
    moderation::SqliteModerationStore,
>;
