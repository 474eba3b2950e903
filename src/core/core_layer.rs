// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "clock.rs"]
pub mod clock;

#[path = "guild_locks.rs"]
pub mod guild_locks;

#[path = "snowflake.rs"]
pub mod snowflake;

#[path = "platform/mod.rs"]
pub mod platform;

#[path = "guild_config/mod.rs"]
pub mod guild_config;

#[path = "logging/mod.rs"]
pub mod logging;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "protection/mod.rs"]
pub mod protection;

#[path = "server_stats/mod.rs"]
pub mod server_stats;
