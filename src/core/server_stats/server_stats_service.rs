// Stats aggregation - read-only, never takes a guild lock.
//
// Platform trouble never fails a stats read: the numbers drop to zero and
// `bot_status` goes Offline, which is exactly what the dashboard should show.

use super::server_stats_models::{format_uptime, BotStatus, GuildStats};
use crate::core::clock::Clock;
use crate::core::guild_locks::ConfigScope;
use crate::core::moderation::ModerationState;
use crate::core::platform::{MemberBreakdown, PlatformGateway};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct ServerStatsService {
    gateway: Arc<dyn PlatformGateway>,
    moderation: Arc<ModerationState>,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
}

impl ServerStatsService {
    /// Uptime is measured from the moment the service is built.
    pub fn new(
        gateway: Arc<dyn PlatformGateway>,
        moderation: Arc<ModerationState>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let started_at = clock.now();
        Self {
            gateway,
            moderation,
            clock,
            started_at,
        }
    }

    pub async fn compute(&self, scope: ConfigScope) -> GuildStats {
        let now = self.clock.now();
        let mut online = self.gateway.is_connected();

        let guild_ids: Vec<u64> = match self.gateway.guilds().await {
            Ok(guilds) => guilds.into_iter().map(|g| g.id).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list guilds for stats");
                online = false;
                Vec::new()
            }
        };
        let total_servers = guild_ids.len() as u64;

        let counted = match scope {
            ConfigScope::Guild(id) => vec![id],
            ConfigScope::Global => guild_ids,
        };

        let mut members = MemberBreakdown::default();
        if online {
            for guild_id in counted {
                match self.gateway.member_breakdown(guild_id).await {
                    Ok(breakdown) => {
                        members.verified += breakdown.verified;
                        members.pending += breakdown.pending;
                    }
                    Err(e) => tracing::warn!(guild_id, error = %e, "Could not count members"),
                }
            }
        }

        let moderation = match scope {
            ConfigScope::Guild(id) => self.moderation.status(id, now),
            ConfigScope::Global => self.moderation.combined_status(now),
        };

        GuildStats {
            total_members: members.verified + members.pending,
            verified_members: members.verified,
            pending_members: members.pending,
            total_servers,
            uptime: format_uptime(now - self.started_at),
            bot_status: if online {
                BotStatus::Online
            } else {
                BotStatus::Offline
            },
            raid_mode_active: moderation.raid_mode_active,
            lockdown_active: moderation.lockdown_active,
            lockdown_expires_at: moderation.lockdown_expires_at,
            lockdown_remaining_secs: moderation.lockdown_remaining_secs,
        }
    }
}
