// Live raid mode / lockdown table shared by the action controller (which
// writes it under guild locks, after persisting) and the stats aggregator
// (which only reads).

use super::moderation_models::{GuildModeration, ModerationStatus};
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct ModerationState {
    guilds: DashMap<u64, GuildModeration>,
}

impl ModerationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: u64) -> GuildModeration {
        self.guilds
            .get(&guild_id)
            .map(|entry| *entry)
            .unwrap_or_default()
    }

    pub fn set(&self, guild_id: u64, state: GuildModeration) {
        self.guilds.insert(guild_id, state);
    }

    pub fn status(&self, guild_id: u64, now: DateTime<Utc>) -> ModerationStatus {
        ModerationStatus::of(&self.get(guild_id), now)
    }

    /// Status across every guild: an axis is active if it's active anywhere.
    pub fn combined_status(&self, now: DateTime<Utc>) -> ModerationStatus {
        let mut status = ModerationStatus::default();
        for entry in self.guilds.iter() {
            status.raid_mode_active |= entry.raid_mode.active;
            status.lockdown_active |= entry.lockdown.is_active_at(now);
        }
        status
    }

    /// Guilds whose lockdown has run out but hasn't been cleared yet.
    pub fn due_lockdowns(&self, now: DateTime<Utc>) -> Vec<u64> {
        self.guilds
            .iter()
            .filter(|entry| entry.lockdown.is_due(now))
            .map(|entry| *entry.key())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::LockdownState;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_due_lockdowns_are_found() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let state = ModerationState::new();
        state.set(
            1,
            GuildModeration {
                lockdown: LockdownState::until(now + Duration::minutes(1)),
                ..Default::default()
            },
        );
        state.set(
            2,
            GuildModeration {
                lockdown: LockdownState::until(now + Duration::minutes(5)),
                ..Default::default()
            },
        );

        let later = now + Duration::minutes(2);
        assert_eq!(state.due_lockdowns(later), vec![1]);
        assert!(state.combined_status(later).lockdown_active);
        assert!(!state.status(1, later).lockdown_active);
    }
}
