// Moderation domain models - raid mode, lockdown and backup data.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer turns state changes into permission overwrites.

use crate::core::guild_config::GuildConfig;
use crate::core::platform::GuildStructure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raid mode for one guild. Only ever changed by an explicit enable/disable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidModeState {
    pub active: bool,
    pub activated_at: Option<DateTime<Utc>>,
}

/// A timed lockdown. `expires_at` is set whenever `active` is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockdownState {
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LockdownState {
    pub fn until(expires_at: DateTime<Utc>) -> Self {
        Self {
            active: true,
            expires_at: Some(expires_at),
        }
    }

    /// Whether the lockdown is still in force at `now`. An elapsed lockdown
    /// reads as inactive even before anything has cleared it.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active && self.expires_at.is_some_and(|t| t > now)
    }

    /// Marked active but past its expiry.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_active_at(now)
    }

    pub fn remaining_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        if !self.is_active_at(now) {
            return None;
        }
        self.expires_at.map(|t| (t - now).num_seconds())
    }
}

/// Both moderation axes of one guild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildModeration {
    pub raid_mode: RaidModeState,
    pub lockdown: LockdownState,
}

impl GuildModeration {
    /// Whether channels should currently be locked for `@everyone`.
    pub fn channels_locked(&self, now: DateTime<Utc>) -> bool {
        self.raid_mode.active || self.lockdown.is_active_at(now)
    }
}

/// Read-only view of a guild's moderation state at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModerationStatus {
    pub raid_mode_active: bool,
    pub raid_mode_activated_at: Option<DateTime<Utc>>,
    pub lockdown_active: bool,
    pub lockdown_expires_at: Option<DateTime<Utc>>,
    pub lockdown_remaining_secs: Option<i64>,
}

impl ModerationStatus {
    pub fn of(state: &GuildModeration, now: DateTime<Utc>) -> Self {
        let lockdown_active = state.lockdown.is_active_at(now);
        Self {
            raid_mode_active: state.raid_mode.active,
            raid_mode_activated_at: state.raid_mode.activated_at,
            lockdown_active,
            lockdown_expires_at: state.lockdown.expires_at.filter(|_| lockdown_active),
            lockdown_remaining_secs: state.lockdown.remaining_secs(now),
        }
    }
}

/// Requested raid mode transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidAction {
    Enable,
    Disable,
}

impl FromStr for RaidAction {
    type Err = String;

    /// Accepts the dashboard's `enable`/`disable` and the chat command's `on`/`off`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "enable" | "on" => Ok(RaidAction::Enable),
            "disable" | "off" => Ok(RaidAction::Disable),
            other => Err(format!("must be enable or disable, got '{}'", other)),
        }
    }
}

/// Bumped whenever `BackupPayload` changes shape.
pub const BACKUP_SCHEMA_VERSION: u32 = 1;

/// What a backup captures. Stored as JSON inside a `BackupSnapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupPayload {
    pub schema_version: u32,
    pub config: GuildConfig,
    pub moderation: GuildModeration,
    pub structure: GuildStructure,
}

/// The latest backup of a guild.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSnapshot {
    pub guild_id: u64,
    pub created_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}
