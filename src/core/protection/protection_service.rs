// Protection service - reacts to attacks without waiting for an admin.
//
// A burst of joins or structural changes turns raid mode on through the
// moderation controller, so an automatic response looks exactly like an
// admin pressing the button. A mass deletion also rolls the guild back to
// its latest backup first.

use super::message_screen::MessageScreen;
use super::protection_models::{GuardEvent, MessageViolation, Threat};
use super::raid_detector::RaidDetector;
use crate::core::clock::Clock;
use crate::core::guild_config::{ConfigError, GuildConfigService, GuildConfigStore};
use crate::core::guild_locks::ConfigScope;
use crate::core::logging::{LogKind, LogRegistry};
use crate::core::moderation::{
    ActionError, BackupStore, ModerationService, ModerationStore, RaidAction,
};
use std::sync::Arc;

pub struct ProtectionService<C: GuildConfigStore, B: BackupStore, M: ModerationStore> {
    config: Arc<GuildConfigService<C>>,
    moderation: Arc<ModerationService<C, B, M>>,
    logs: Arc<LogRegistry>,
    clock: Arc<dyn Clock>,
    detector: RaidDetector,
    screen: MessageScreen,
}

impl<C: GuildConfigStore, B: BackupStore, M: ModerationStore> ProtectionService<C, B, M> {
    pub fn new(
        config: Arc<GuildConfigService<C>>,
        moderation: Arc<ModerationService<C, B, M>>,
        logs: Arc<LogRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            moderation,
            logs,
            clock,
            detector: RaidDetector::new(),
            screen: MessageScreen::new(),
        }
    }

    /// Feed one gateway event. Returns the threat it completed, if any, after
    /// responding to it.
    pub async fn observe(
        &self,
        guild_id: u64,
        event: GuardEvent,
    ) -> Result<Option<Threat>, ActionError> {
        let config = self.config.get(ConfigScope::Guild(guild_id)).await?;
        let Some(threat) = self
            .detector
            .record(guild_id, event, &config, self.clock.now())
        else {
            return Ok(None);
        };

        tracing::warn!(guild_id, %threat, "Attack detected");
        self.logs
            .record(LogKind::Warning, Some(guild_id), threat.to_string());

        // Restore before raising raid mode: the backup carries its own flag.
        if threat.needs_restore() {
            self.auto_restore(guild_id).await;
        }
        self.moderation
            .set_raid_mode(guild_id, RaidAction::Enable)
            .await?;

        Ok(Some(threat))
    }

    async fn auto_restore(&self, guild_id: u64) {
        match self.moderation.restore(guild_id).await {
            Ok(_) => self.logs.record(
                LogKind::Success,
                Some(guild_id),
                "Server restored from backup after mass deletion.",
            ),
            Err(ActionError::NotFound(_)) => self.logs.record(
                LogKind::Warning,
                Some(guild_id),
                "No backup available to restore after mass deletion.",
            ),
            Err(e) => {
                tracing::error!(guild_id, error = %e, "Automatic restore failed");
                self.logs.record(
                    LogKind::Error,
                    Some(guild_id),
                    format!("Automatic restore failed: {}", e),
                );
            }
        }
    }

    /// Check a member's message. A violation is logged; removing the message
    /// is up to the caller.
    pub async fn screen_message(
        &self,
        guild_id: u64,
        user_id: u64,
        content: &str,
        mentions: u32,
    ) -> Result<Option<MessageViolation>, ConfigError> {
        let config = self.config.get(ConfigScope::Guild(guild_id)).await?;
        let violation =
            self.screen
                .check(guild_id, user_id, content, mentions, &config, self.clock.now());

        if let Some(violation) = &violation {
            tracing::info!(guild_id, user_id, %violation, "Message blocked");
            self.logs.record(
                LogKind::Moderation,
                Some(guild_id),
                format!("Removed a message from user {}: {}", user_id, violation),
            );
        }
        Ok(violation)
    }

    /// Drop counters nobody has touched recently.
    pub fn prune(&self) {
        let now = self.clock.now();
        self.detector.prune(now);
        self.screen.prune(now);
    }
}

// ============================================================================
// TESTS
// ============================================================================
