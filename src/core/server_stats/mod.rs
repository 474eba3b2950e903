pub mod server_stats_models;
pub mod server_stats_service;

pub use server_stats_models::{format_uptime, BotStatus, GuildStats};
pub use server_stats_service::ServerStatsService;
