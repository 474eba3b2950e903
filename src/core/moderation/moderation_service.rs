// Moderation action controller - raid mode, timed lockdown, backup/restore.
//
// Every state change for a guild happens while holding that guild's lock,
// and is followed by re-applying the channel lock on the platform so the
// platform always mirrors `raid_mode || lockdown`.
//
// NO Discord dependencies here - the platform is reached through the
// `PlatformGateway` port.

use super::moderation_models::{
    BackupPayload, BackupSnapshot, GuildModeration, LockdownState, ModerationStatus, RaidAction,
    RaidModeState, BACKUP_SCHEMA_VERSION,
};
use super::moderation_state::ModerationState;
use crate::core::clock::Clock;
use crate::core::guild_config::{ConfigError, GuildConfigService, GuildConfigStore};
use crate::core::guild_locks::{ConfigScope, GuildLocks, ScopeGuard};
use crate::core::logging::{LogKind, LogRegistry};
use crate::core::platform::PlatformGateway;
use async_trait::async_trait;
use chrono::Duration;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Backup failed: {0}")]
    Backup(String),

    #[error("Restore failed: {0}")]
    Restore(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Keeps the latest backup per guild.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Store `snapshot`, replacing any earlier backup of the same guild.
    async fn save(&self, snapshot: &BackupSnapshot) -> Result<(), ActionError>;

    async fn latest(&self, guild_id: u64) -> Result<Option<BackupSnapshot>, ActionError>;
}

/// Keeps each guild's raid mode and lockdown across restarts.
#[async_trait]
pub trait ModerationStore: Send + Sync {
    async fn save(&self, guild_id: u64, state: &GuildModeration) -> Result<(), ActionError>;

    async fn load_all(&self) -> Result<Vec<(u64, GuildModeration)>, ActionError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<C: GuildConfigStore, B: BackupStore, M: ModerationStore> {
    config: Arc<GuildConfigService<C>>,
    backups: B,
    saved: M,
    state: Arc<ModerationState>,
    gateway: Arc<dyn PlatformGateway>,
    logs: Arc<LogRegistry>,
    clock: Arc<dyn Clock>,
}

impl<C: GuildConfigStore, B: BackupStore, M: ModerationStore> ModerationService<C, B, M> {
    pub fn new(
        config: Arc<GuildConfigService<C>>,
        backups: B,
        saved: M,
        state: Arc<ModerationState>,
        gateway: Arc<dyn PlatformGateway>,
        logs: Arc<LogRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            backups,
            saved,
            state,
            gateway,
            logs,
            clock,
        }
    }

    fn locks(&self) -> &GuildLocks {
        self.config.locks()
    }

    /// Load the persisted raid mode / lockdown table. Lockdowns that ran out
    /// while we were down are left for the sweeper to finish.
    pub async fn load_state(&self) -> Result<usize, ActionError> {
        let saved = self.saved.load_all().await?;
        let count = saved.len();
        for (guild_id, state) in saved {
            self.state.set(guild_id, state);
        }
        Ok(count)
    }

    /// Persist then publish a guild's new state. Must hold the guild lock.
    async fn commit(&self, guild_id: u64, state: GuildModeration) -> Result<(), ActionError> {
        self.saved.save(guild_id, &state).await?;
        self.state.set(guild_id, state);
        Ok(())
    }

    /// Current raid mode / lockdown view. Never blocks on guild locks; an
    /// elapsed lockdown already reads as inactive here.
    pub fn status(&self, guild_id: u64) -> ModerationStatus {
        self.state.status(guild_id, self.clock.now())
    }

    // ------------------------------------------------------------------------
    // Raid mode
    // ------------------------------------------------------------------------

    pub async fn set_raid_mode(
        &self,
        guild_id: u64,
        action: RaidAction,
    ) -> Result<String, ActionError> {
        let guard = self.locks().acquire(ConfigScope::Guild(guild_id)).await;
        self.finish_due_lockdown(&guard, guild_id).await;

        let now = self.clock.now();
        let mut state = self.state.get(guild_id);
        let wanted = action == RaidAction::Enable;

        if state.raid_mode.active == wanted {
            let message = if wanted {
                "Raid mode is already active."
            } else {
                "Raid mode is already inactive."
            };
            self.logs.record(LogKind::Moderation, Some(guild_id), message);
            return Ok(message.to_string());
        }

        state.raid_mode = if wanted {
            RaidModeState {
                active: true,
                activated_at: Some(now),
            }
        } else {
            RaidModeState::default()
        };
        self.commit(guild_id, state).await?;

        let message = if wanted {
            "Raid mode activated."
        } else {
            "Raid mode deactivated."
        };
        tracing::info!(guild_id, active = wanted, "Raid mode changed");
        self.logs.record(LogKind::Moderation, Some(guild_id), message);
        self.enforce(&guard, guild_id).await;

        Ok(message.to_string())
    }

    pub async fn raid_mode(
        &self,
        scope: ConfigScope,
        action: RaidAction,
    ) -> Result<String, ActionError> {
        self.for_scope(scope, "Raid mode change", |id| self.set_raid_mode(id, action))
            .await
    }

    // ------------------------------------------------------------------------
    // Lockdown
    // ------------------------------------------------------------------------

    /// Lock a guild for `minutes` (or its configured default). Re-triggering
    /// an active lockdown restarts the timer with the new duration.
    pub async fn trigger_lockdown(
        &self,
        guild_id: u64,
        minutes: Option<i64>,
    ) -> Result<String, ActionError> {
        let minutes = match minutes {
            Some(m) => m,
            None => {
                self.config
                    .get(ConfigScope::Guild(guild_id))
                    .await?
                    .lockdown_default_minutes as i64
            }
        };
        if minutes <= 0 {
            return Err(ActionError::Validation {
                field: "minutes",
                reason: "must be greater than zero".to_string(),
            });
        }
        let duration = Duration::try_minutes(minutes).ok_or_else(|| ActionError::Validation {
            field: "minutes",
            reason: "is too large".to_string(),
        })?;

        let guard = self.locks().acquire(ConfigScope::Guild(guild_id)).await;
        self.finish_due_lockdown(&guard, guild_id).await;

        let now = self.clock.now();
        let mut state = self.state.get(guild_id);
        let was_active = state.lockdown.is_active_at(now);
        state.lockdown = LockdownState::until(now + duration);
        self.commit(guild_id, state).await?;

        let message = if was_active {
            format!("Lockdown reset to {} minute(s).", minutes)
        } else {
            format!("Lockdown activated for {} minute(s).", minutes)
        };
        tracing::info!(guild_id, minutes, "Lockdown triggered");
        self.logs.record(LogKind::Moderation, Some(guild_id), &message);
        if !was_active {
            self.enforce(&guard, guild_id).await;
        }

        Ok(message)
    }

    pub async fn lockdown(
        &self,
        scope: ConfigScope,
        minutes: Option<i64>,
    ) -> Result<String, ActionError> {
        self.for_scope(scope, "Lockdown", |id| self.trigger_lockdown(id, minutes))
            .await
    }

    /// End a lockdown before it expires.
    pub async fn cancel_lockdown(&self, guild_id: u64) -> Result<String, ActionError> {
        let guard = self.locks().acquire(ConfigScope::Guild(guild_id)).await;
        self.finish_due_lockdown(&guard, guild_id).await;

        let mut state = self.state.get(guild_id);
        if !state.lockdown.active {
            return Ok("No lockdown is active.".to_string());
        }
        state.lockdown = LockdownState::default();
        self.commit(guild_id, state).await?;

        let message = "Lockdown cancelled.";
        tracing::info!(guild_id, "Lockdown cancelled");
        self.logs.record(LogKind::Moderation, Some(guild_id), message);
        self.enforce(&guard, guild_id).await;

        Ok(message.to_string())
    }

    pub async fn cancel(&self, scope: ConfigScope) -> Result<String, ActionError> {
        self.for_scope(scope, "Lockdown cancel", |id| self.cancel_lockdown(id))
            .await
    }

    /// Clear every lockdown that has run out and unlock those guilds.
    /// Returns the guilds that were unlocked.
    pub async fn sweep_expired(&self) -> Vec<u64> {
        let mut unlocked = Vec::new();
        for guild_id in self.state.due_lockdowns(self.clock.now()) {
            let guard = self.locks().acquire(ConfigScope::Guild(guild_id)).await;
            // Someone may have re-triggered or cancelled while we waited.
            if self.finish_due_lockdown(&guard, guild_id).await {
                unlocked.push(guild_id);
            }
        }
        unlocked
    }

    /// Clear a lockdown that has run out and lift the channel lock it held.
    /// Returns whether there was one. Every transition calls this first, so
    /// whichever of them or the sweeper gets there first does the unlock.
    async fn finish_due_lockdown(&self, guard: &ScopeGuard, guild_id: u64) -> bool {
        let mut state = self.state.get(guild_id);
        if !state.lockdown.is_due(self.clock.now()) {
            return false;
        }
        state.lockdown = LockdownState::default();
        self.state.set(guild_id, state);
        // A stale row only means the sweeper finishes it again after a restart.
        if let Err(e) = self.saved.save(guild_id, &state).await {
            tracing::warn!(guild_id, error = %e, "Could not persist expired lockdown");
        }

        tracing::info!(guild_id, "Lockdown expired");
        self.logs.record(
            LogKind::Moderation,
            Some(guild_id),
            "Lockdown expired; server unlocked.",
        );
        self.enforce(guard, guild_id).await;
        true
    }

    // ------------------------------------------------------------------------
    // Backup / restore
    // ------------------------------------------------------------------------

    pub async fn backup(&self, guild_id: u64) -> Result<String, ActionError> {
        let structure = self
            .gateway
            .snapshot_structure(guild_id)
            .await
            .map_err(|e| ActionError::Backup(format!("guild {}: {}", guild_id, e)))?;

        let _guard = self.locks().acquire(ConfigScope::Guild(guild_id)).await;
        let payload = BackupPayload {
            schema_version: BACKUP_SCHEMA_VERSION,
            config: self.config.get(ConfigScope::Guild(guild_id)).await?,
            moderation: self.state.get(guild_id),
            structure,
        };
        let snapshot = BackupSnapshot {
            guild_id,
            created_at: self.clock.now(),
            payload: serde_json::to_value(&payload)
                .map_err(|e| ActionError::Backup(e.to_string()))?,
        };
        self.backups.save(&snapshot).await?;

        let summary = format!(
            "Backup created: {} roles, {} channels.",
            payload.structure.roles.len(),
            payload.structure.channels.len() + payload.structure.categories.len()
        );
        tracing::info!(guild_id, "{}", summary);
        self.logs.record(LogKind::Success, Some(guild_id), summary);

        Ok("Backup completed.".to_string())
    }

    pub async fn backup_scope(&self, scope: ConfigScope) -> Result<String, ActionError> {
        self.for_scope(scope, "Backup", |id| self.backup(id)).await
    }

    /// Roll a guild back to its latest backup. The config and moderation state
    /// are replaced together or not at all; the platform structure is then
    /// restored best effort.
    pub async fn restore(&self, guild_id: u64) -> Result<String, ActionError> {
        let snapshot = self.backups.latest(guild_id).await?.ok_or_else(|| {
            ActionError::NotFound(format!("No backup exists for guild {}", guild_id))
        })?;
        let payload = decode_payload(&snapshot)?;

        let guard = self.locks().acquire(ConfigScope::Guild(guild_id)).await;

        let now = self.clock.now();
        let mut moderation = payload.moderation;
        if !moderation.lockdown.is_active_at(now) {
            moderation.lockdown = LockdownState::default();
        }

        // Persist the state first and put it back if the config write fails,
        // so nothing is published unless both went through.
        let previous = self.state.get(guild_id);
        self.saved.save(guild_id, &moderation).await?;
        if let Err(e) = self.config.replace(&guard, payload.config.clone()).await {
            if let Err(undo) = self.saved.save(guild_id, &previous).await {
                tracing::error!(guild_id, error = %undo, "Could not roll back moderation state");
            }
            return Err(e.into());
        }
        self.state.set(guild_id, moderation);

        match self
            .gateway
            .restore_structure(guild_id, &payload.structure)
            .await
        {
            Ok(report) => tracing::info!(
                guild_id,
                roles = report.roles_created,
                categories = report.categories_created,
                channels = report.channels_created,
                members = report.members_updated,
                "Guild structure restored"
            ),
            Err(e) => {
                tracing::warn!(guild_id, error = %e, "Could not restore guild structure");
                self.logs.record(
                    LogKind::Warning,
                    Some(guild_id),
                    format!("Guild structure was not restored: {}", e),
                );
            }
        }
        self.enforce(&guard, guild_id).await;

        let message = format!(
            "Restored from backup taken at {}.",
            snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        self.logs
            .record(LogKind::Moderation, Some(guild_id), &message);
        Ok(message)
    }

    pub async fn restore_scope(&self, scope: ConfigScope) -> Result<String, ActionError> {
        self.for_scope(scope, "Restore", |id| self.restore(id)).await
    }

    // ------------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------------

    /// Bring the platform's channel permissions in line with the guild's state.
    /// Failures are logged, never returned: the state change already happened.
    async fn enforce(&self, _guard: &ScopeGuard, guild_id: u64) {
        let locked = self.state.get(guild_id).channels_locked(self.clock.now());
        match self.gateway.set_channels_locked(guild_id, locked).await {
            Ok(channels) => tracing::info!(guild_id, locked, channels, "Channel lock applied"),
            Err(e) => {
                tracing::warn!(guild_id, locked, error = %e, "Could not apply channel lock");
                self.logs.record(
                    LogKind::Warning,
                    Some(guild_id),
                    format!("Channel permissions were not updated: {}", e),
                );
            }
        }
    }

    /// Run `op` for one guild, or for every known guild when no guild is selected.
    async fn for_scope<'a, F, Fut>(
        &'a self,
        scope: ConfigScope,
        what: &str,
        op: F,
    ) -> Result<String, ActionError>
    where
        F: Fn(u64) -> Fut,
        Fut: Future<Output = Result<String, ActionError>> + 'a,
    {
        if let ConfigScope::Guild(guild_id) = scope {
            return op(guild_id).await;
        }

        let targets: Vec<u64> = match self.gateway.guilds().await {
            Ok(guilds) => guilds.into_iter().map(|g| g.id).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list guilds");
                Vec::new()
            }
        };
        if targets.is_empty() {
            return Err(ActionError::NotFound("No guilds are available".to_string()));
        }

        let mut succeeded = 0;
        let mut last_error = None;
        for guild_id in &targets {
            match op(*guild_id).await {
                Ok(_) => succeeded += 1,
                Err(e) => {
                    tracing::warn!(guild_id, error = %e, "{} failed", what);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            _ => Ok(format!(
                "{} applied to {} of {} guild(s).",
                what,
                succeeded,
                targets.len()
            )),
        }
    }
}

/// Turn a stored snapshot back into a payload, rejecting anything we can't
/// restore faithfully.
fn decode_payload(snapshot: &BackupSnapshot) -> Result<BackupPayload, ActionError> {
    let version = snapshot
        .payload
        .get("schema_version")
        .and_then(|v| v.as_u64());
    if version != Some(BACKUP_SCHEMA_VERSION as u64) {
        return Err(ActionError::Restore(format!(
            "backup of guild {} has unsupported schema version {:?}",
            snapshot.guild_id, version
        )));
    }

    let payload: BackupPayload = serde_json::from_value(snapshot.payload.clone())
        .map_err(|e| ActionError::Restore(format!("backup is malformed: {}", e)))?;

    let invalid = payload.config.invalid_fields();
    if !invalid.is_empty() {
        return Err(ActionError::Restore(format!(
            "backup contains invalid fields: {}",
            invalid.join(", ")
        )));
    }
    Ok(payload)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::core::guild_config::GuildConfigPatch;
    use crate::core::logging::LogFilter;
    use crate::core::platform::fake_gateway::FakeGateway;
    use crate::infra::guild_config::InMemoryGuildConfigStore;
    use crate::infra::moderation::{InMemoryBackupStore, InMemoryModerationStore};
    use serde_json::json;

    type Service =
        ModerationService<InMemoryGuildConfigStore, InMemoryBackupStore, InMemoryModerationStore>;

    struct Harness {
        service: Service,
        config: Arc<GuildConfigService<InMemoryGuildConfigStore>>,
        gateway: Arc<FakeGateway>,
        logs: Arc<LogRegistry>,
        clock: Arc<ManualClock>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new());
        let gateway = Arc::new(
            FakeGateway::new()
                .with_guild(1, "One", 3, 1)
                .with_guild(2, "Two", 5, 0),
        );
        let logs = Arc::new(LogRegistry::new(100, clock.clone()));
        let config = Arc::new(GuildConfigService::new(
            InMemoryGuildConfigStore::new(),
            Arc::new(GuildLocks::new()),
        ));
        let service = ModerationService::new(
            Arc::clone(&config),
            InMemoryBackupStore::new(),
            InMemoryModerationStore::new(),
            Arc::new(ModerationState::new()),
            gateway.clone(),
            Arc::clone(&logs),
            clock.clone(),
        );
        Harness {
            service,
            config,
            gateway,
            logs,
            clock,
        }
    }

    #[tokio::test]
    async fn test_enable_twice_is_idempotent() {
        let h = harness();

        let first = h.service.set_raid_mode(1, RaidAction::Enable).await.unwrap();
        let second = h.service.set_raid_mode(1, RaidAction::Enable).await.unwrap();

        assert_eq!(first, "Raid mode activated.");
        assert_eq!(second, "Raid mode is already active.");
        assert!(h.service.status(1).raid_mode_active);
        // Only the real transition touches the platform.
        assert_eq!(h.gateway.lock_calls(), vec![(1, true)]);
        // Both calls are logged as moderation events.
        assert_eq!(
            h.logs
                .list(LogFilter::Kind(LogKind::Moderation), Some(1))
                .len(),
            2
        );
    }

    #[tokio::test]
    async fn test_disable_unlocks_unless_lockdown_active() {
        let h = harness();
        h.service.set_raid_mode(1, RaidAction::Enable).await.unwrap();
        h.service.trigger_lockdown(1, Some(5)).await.unwrap();
        h.service
            .set_raid_mode(1, RaidAction::Disable)
            .await
            .unwrap();

        // Lockdown still holds the channels.
        assert_eq!(h.gateway.lock_calls().last(), Some(&(1, true)));
        assert!(!h.service.status(1).raid_mode_active);
        assert!(h.service.status(1).lockdown_active);
    }

    #[tokio::test]
    async fn test_lockdown_expires_after_duration() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(10)).await.unwrap();

        h.clock.advance(Duration::minutes(9));
        let status = h.service.status(1);
        assert!(status.lockdown_active);
        assert_eq!(status.lockdown_remaining_secs, Some(60));

        h.clock.advance(Duration::minutes(1));
        let status = h.service.status(1);
        assert!(!status.lockdown_active);
        assert_eq!(status.lockdown_remaining_secs, None);
    }

    #[tokio::test]
    async fn test_retrigger_resets_timer() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(10)).await.unwrap();
        h.clock.advance(Duration::minutes(8));

        let message = h.service.trigger_lockdown(1, Some(5)).await.unwrap();
        assert_eq!(message, "Lockdown reset to 5 minute(s).");
        assert_eq!(h.service.status(1).lockdown_remaining_secs, Some(300));

        h.clock.advance(Duration::minutes(4));
        assert!(h.service.status(1).lockdown_active);
        h.clock.advance(Duration::minutes(1));
        assert!(!h.service.status(1).lockdown_active);
    }

    #[tokio::test]
    async fn test_lockdown_rejects_non_positive_minutes() {
        let h = harness();
        for minutes in [0, -5] {
            let err = h
                .service
                .trigger_lockdown(1, Some(minutes))
                .await
                .unwrap_err();
            assert!(matches!(err, ActionError::Validation { field: "minutes", .. }));
        }
        assert!(!h.service.status(1).lockdown_active);
        assert!(h.gateway.lock_calls().is_empty());
    }

    #[tokio::test]
    async fn test_lockdown_uses_configured_default() {
        let h = harness();
        let patch: GuildConfigPatch =
            serde_json::from_value(json!({"lockdown_default_minutes": 3})).unwrap();
        h.config.update(ConfigScope::Guild(1), &patch).await.unwrap();

        let message = h.service.trigger_lockdown(1, None).await.unwrap();
        assert_eq!(message, "Lockdown activated for 3 minute(s).");
    }

    #[tokio::test]
    async fn test_sweep_unlocks_expired_guilds() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(15)).await.unwrap();
        h.service.trigger_lockdown(2, Some(30)).await.unwrap();

        h.clock.advance(Duration::minutes(16));
        assert_eq!(h.service.sweep_expired().await, vec![1]);
        assert_eq!(h.gateway.lock_calls().last(), Some(&(1, false)));
        assert!(h.service.sweep_expired().await.is_empty());
        assert!(h.service.status(2).lockdown_active);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(15)).await.unwrap();
        assert_eq!(
            h.service.cancel_lockdown(1).await.unwrap(),
            "Lockdown cancelled."
        );
        assert_eq!(
            h.service.cancel_lockdown(1).await.unwrap(),
            "No lockdown is active."
        );
        h.clock.advance(Duration::minutes(20));
        assert!(h.service.sweep_expired().await.is_empty());
    }

    #[tokio::test]
    async fn test_restore_without_backup_is_not_found() {
        let h = harness();
        let patch: GuildConfigPatch = serde_json::from_value(json!({"raid_threshold": 9})).unwrap();
        h.config.update(ConfigScope::Guild(1), &patch).await.unwrap();

        let err = h.service.restore(1).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
        assert_eq!(
            h.config
                .get(ConfigScope::Guild(1))
                .await
                .unwrap()
                .raid_threshold,
            9
        );
    }

    #[tokio::test]
    async fn test_backup_then_restore_rolls_back_config_and_state() {
        let h = harness();
        let scope = ConfigScope::Guild(1);
        let patch: GuildConfigPatch =
            serde_json::from_value(json!({"raid_threshold": 4, "bad_words": ["scam"]})).unwrap();
        h.config.update(scope, &patch).await.unwrap();
        h.service.backup(1).await.unwrap();

        let patch: GuildConfigPatch =
            serde_json::from_value(json!({"raid_threshold": 20, "bad_words": []})).unwrap();
        h.config.update(scope, &patch).await.unwrap();
        h.service.set_raid_mode(1, RaidAction::Enable).await.unwrap();

        h.service.restore(1).await.unwrap();

        let config = h.config.get(scope).await.unwrap();
        assert_eq!(config.raid_threshold, 4);
        assert!(config.bad_words.contains("scam"));
        assert!(!h.service.status(1).raid_mode_active);
        assert_eq!(*h.gateway.restore_calls.lock().unwrap(), vec![1]);
        assert_eq!(h.gateway.lock_calls().last(), Some(&(1, false)));
    }

    #[tokio::test]
    async fn test_backup_of_unknown_guild_fails() {
        let h = harness();
        let err = h.service.backup(404).await.unwrap_err();
        assert!(matches!(err, ActionError::Backup(_)));
    }

    #[tokio::test]
    async fn test_restore_rejects_schema_mismatch_atomically() {
        let h = harness();
        let scope = ConfigScope::Guild(1);
        let patch: GuildConfigPatch = serde_json::from_value(json!({"raid_threshold": 6})).unwrap();
        h.config.update(scope, &patch).await.unwrap();

        h.service
            .backups
            .save(&BackupSnapshot {
                guild_id: 1,
                created_at: h.clock.now(),
                payload: json!({"schema_version": 99, "config": {}}),
            })
            .await
            .unwrap();
        let err = h.service.restore(1).await.unwrap_err();
        assert!(matches!(err, ActionError::Restore(_)));

        h.service
            .backups
            .save(&BackupSnapshot {
                guild_id: 1,
                created_at: h.clock.now(),
                payload: json!({"schema_version": BACKUP_SCHEMA_VERSION, "config": "nope"}),
            })
            .await
            .unwrap();
        let err = h.service.restore(1).await.unwrap_err();
        assert!(matches!(err, ActionError::Restore(_)));

        assert_eq!(h.config.get(scope).await.unwrap().raid_threshold, 6);
        assert!(h.gateway.restore_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restored_expired_lockdown_is_cleared() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(10)).await.unwrap();
        h.service.backup(1).await.unwrap();

        h.clock.advance(Duration::minutes(30));
        h.service.restore(1).await.unwrap();

        assert!(!h.service.status(1).lockdown_active);
        assert!(h.service.sweep_expired().await.is_empty());
    }

    #[tokio::test]
    async fn test_global_scope_fans_out() {
        let h = harness();
        let message = h
            .service
            .raid_mode(ConfigScope::Global, RaidAction::Enable)
            .await
            .unwrap();
        assert_eq!(message, "Raid mode change applied to 2 of 2 guild(s).");
        assert!(h.service.status(1).raid_mode_active);
        assert!(h.service.status(2).raid_mode_active);

        let err = h.service.restore_scope(ConfigScope::Global).await.unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_platform_outage_does_not_fail_transition() {
        let h = harness();
        h.gateway.set_connected(false);

        let message = h.service.set_raid_mode(1, RaidAction::Enable).await.unwrap();
        assert_eq!(message, "Raid mode activated.");
        assert_eq!(h.logs.list(LogFilter::Kind(LogKind::Warning), Some(1)).len(), 1);

        let err = h
            .service
            .lockdown(ConfigScope::Global, Some(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_disable_twice_is_idempotent() {
        let h = harness();
        h.service.set_raid_mode(1, RaidAction::Enable).await.unwrap();

        let first = h.service.set_raid_mode(1, RaidAction::Disable).await.unwrap();
        let second = h.service.set_raid_mode(1, RaidAction::Disable).await.unwrap();

        assert_eq!(first, "Raid mode deactivated.");
        assert_eq!(second, "Raid mode is already inactive.");
        assert!(!h.service.status(1).raid_mode_active);
        assert_eq!(h.gateway.lock_calls(), vec![(1, true), (1, false)]);
    }

    #[tokio::test]
    async fn test_cancel_after_expiry_still_unlocks() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(10)).await.unwrap();
        h.clock.advance(Duration::minutes(11));

        let message = h.service.cancel_lockdown(1).await.unwrap();
        assert_eq!(message, "No lockdown is active.");
        assert_eq!(h.gateway.lock_calls(), vec![(1, true), (1, false)]);
        assert!(h.service.sweep_expired().await.is_empty());
    }

    #[tokio::test]
    async fn test_raid_noop_after_expiry_still_unlocks() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(10)).await.unwrap();
        h.clock.advance(Duration::minutes(11));

        let message = h
            .service
            .set_raid_mode(1, RaidAction::Disable)
            .await
            .unwrap();
        assert_eq!(message, "Raid mode is already inactive.");
        assert_eq!(h.gateway.lock_calls(), vec![(1, true), (1, false)]);
        assert!(h.service.sweep_expired().await.is_empty());
    }

    #[tokio::test]
    async fn test_raid_enable_after_expiry_keeps_channels_locked() {
        let h = harness();
        h.service.trigger_lockdown(1, Some(10)).await.unwrap();
        h.clock.advance(Duration::minutes(11));

        h.service.set_raid_mode(1, RaidAction::Enable).await.unwrap();
        assert_eq!(h.gateway.lock_calls().last(), Some(&(1, true)));
        assert!(!h.service.status(1).lockdown_active);
        assert!(h.service.status(1).raid_mode_active);
    }

    #[tokio::test]
    async fn test_lockdown_of_fifteen_minutes_is_over_after_sixteen() {
        let h = harness();
        let message = h
            .service
            .lockdown(ConfigScope::Guild(1), Some(15))
            .await
            .unwrap();
        assert_eq!(message, "Lockdown activated for 15 minute(s).");

        h.clock.advance(Duration::minutes(16));
        let status = h.service.status(1);
        assert!(!status.lockdown_active);
        assert_eq!(status.lockdown_expires_at, None);
        assert_eq!(status.lockdown_remaining_secs, None);
    }

    #[tokio::test]
    async fn test_global_lockdown_default_reaches_guilds() {
        let h = harness();
        let patch: GuildConfigPatch =
            serde_json::from_value(json!({"lockdown_default_minutes": 3})).unwrap();
        h.config.update(ConfigScope::Global, &patch).await.unwrap();

        let message = h.service.trigger_lockdown(1, None).await.unwrap();
        assert_eq!(message, "Lockdown activated for 3 minute(s).");
    }

    #[tokio::test]
    async fn test_state_is_reloaded_after_restart() {
        let h = harness();
        h.service.set_raid_mode(2, RaidAction::Enable).await.unwrap();
        h.service.trigger_lockdown(1, Some(60)).await.unwrap();

        // A fresh controller over the same store, as after a restart.
        let restarted = ModerationService::new(
            Arc::clone(&h.config),
            InMemoryBackupStore::new(),
            InMemoryModerationStore::new(),
            Arc::new(ModerationState::new()),
            h.gateway.clone(),
            Arc::clone(&h.logs),
            h.clock.clone(),
        );
        for (guild_id, state) in h.service.saved.load_all().await.unwrap() {
            restarted.saved.save(guild_id, &state).await.unwrap();
        }
        assert_eq!(restarted.load_state().await.unwrap(), 2);
        assert!(restarted.status(1).lockdown_active);
        assert!(restarted.status(2).raid_mode_active);

        h.clock.advance(Duration::minutes(61));
        assert_eq!(restarted.sweep_expired().await, vec![1]);
        assert_eq!(h.gateway.lock_calls().last(), Some(&(1, false)));
        assert!(!restarted.saved.load_all().await.unwrap().iter().any(
            |(id, state)| *id == 1 && state.lockdown.active
        ));
    }
}
