// Config store service - validated, serialized access to per-guild settings.
//
// Reads never fail with "not found": an unconfigured guild inherits the
// global template, which itself starts from the built-in defaults. Writes
// take the scope's lock so two dashboard tabs saving at once can't lose each
// other's changes.

use super::guild_config_models::{FieldIssue, GuildConfig, GuildConfigPatch};
use crate::core::guild_locks::{ConfigScope, GuildLocks, ScopeGuard};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {}", join_issues(.0))]
    Validation(Vec<FieldIssue>),

    #[error("Storage error: {0}")]
    StorageError(String),
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    async fn load(&self, scope: ConfigScope) -> Result<Option<GuildConfig>, ConfigError>;

    async fn save(&self, scope: ConfigScope, config: &GuildConfig) -> Result<(), ConfigError>;

    /// Every guild that has a stored config of its own.
    async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct GuildConfigService<S: GuildConfigStore> {
    store: S,
    locks: Arc<GuildLocks>,
}

impl<S: GuildConfigStore> GuildConfigService<S> {
    pub fn new(store: S, locks: Arc<GuildLocks>) -> Self {
        Self { store, locks }
    }

    /// The lock registry shared with the moderation controller.
    pub fn locks(&self) -> &Arc<GuildLocks> {
        &self.locks
    }

    /// Current settings for `scope`. A guild without its own config gets the
    /// global template; the template falls back to the built-in defaults.
    pub async fn get(&self, scope: ConfigScope) -> Result<GuildConfig, ConfigError> {
        if let Some(config) = self.store.load(scope).await? {
            return Ok(config);
        }
        self.template_for(scope.guild_id()).await
    }

    /// The global template, stamped with `guild_id`.
    async fn template_for(&self, guild_id: Option<u64>) -> Result<GuildConfig, ConfigError> {
        let mut config = self
            .store
            .load(ConfigScope::Global)
            .await?
            .unwrap_or_else(|| GuildConfig::defaults_for(None));
        config.guild_id = guild_id;
        Ok(config)
    }

    /// Validate and merge a partial update, persist it and return the result.
    ///
    /// A global update changes the template and applies the same patch to
    /// every guild that has its own config, leaving their other fields alone.
    pub async fn update(
        &self,
        scope: ConfigScope,
        patch: &GuildConfigPatch,
    ) -> Result<GuildConfig, ConfigError> {
        let merged = self.update_one(scope, patch).await?;
        if scope == ConfigScope::Global {
            for guild_id in self.store.guild_ids().await? {
                if let Err(e) = self.update_one(ConfigScope::Guild(guild_id), patch).await {
                    tracing::warn!(guild_id, error = %e, "Global update not applied to guild");
                }
            }
        }
        Ok(merged)
    }

    async fn update_one(
        &self,
        scope: ConfigScope,
        patch: &GuildConfigPatch,
    ) -> Result<GuildConfig, ConfigError> {
        let _guard = self.locks.acquire(scope).await;

        let current = self.get(scope).await?;
        let merged = patch.apply_to(&current).map_err(ConfigError::Validation)?;
        self.store.save(scope, &merged).await?;

        tracing::info!(%scope, "Configuration updated");
        Ok(merged)
    }

    /// Seed a newly joined guild from the global template. No-op if it already
    /// has a config.
    pub async fn register(&self, guild_id: u64) -> Result<bool, ConfigError> {
        let scope = ConfigScope::Guild(guild_id);
        let _guard = self.locks.acquire(scope).await;

        if self.store.load(scope).await?.is_some() {
            return Ok(false);
        }
        let config = self.template_for(Some(guild_id)).await?;
        self.store.save(scope, &config).await?;
        tracing::info!(guild_id, "Registered guild from the global template");
        Ok(true)
    }

    /// Overwrite a guild's whole config. The caller must already hold that
    /// guild's lock, which is why the guard is part of the signature.
    pub async fn replace(
        &self,
        guard: &ScopeGuard,
        mut config: GuildConfig,
    ) -> Result<(), ConfigError> {
        config.guild_id = guard.scope().guild_id();
        self.store.save(guard.scope(), &config).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::guild_config::InMemoryGuildConfigStore;
    use serde_json::json;

    fn service() -> GuildConfigService<InMemoryGuildConfigStore> {
        GuildConfigService::new(InMemoryGuildConfigStore::new(), Arc::new(GuildLocks::new()))
    }

    fn patch(value: serde_json::Value) -> GuildConfigPatch {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_get_unknown_guild_returns_defaults() {
        let service = service();
        let config = service.get(ConfigScope::Guild(99)).await.unwrap();
        assert_eq!(config, GuildConfig::defaults_for(Some(99)));
    }

    #[tokio::test]
    async fn test_update_then_read_merges() {
        let service = service();
        let scope = ConfigScope::Guild(1);

        service
            .update(scope, &patch(json!({"raid_threshold": 8})))
            .await
            .unwrap();
        service
            .update(scope, &patch(json!({"spam_threshold": 2})))
            .await
            .unwrap();

        let config = service.get(scope).await.unwrap();
        assert_eq!(config.raid_threshold, 8);
        assert_eq!(config.spam_threshold, 2);
        assert_eq!(config.raid_window, 60);
        assert_eq!(config.guild_id, Some(1));
    }

    #[tokio::test]
    async fn test_negative_threshold_leaves_config_unchanged() {
        let service = service();
        let scope = ConfigScope::Guild(1);
        service
            .update(scope, &patch(json!({"raid_threshold": 7})))
            .await
            .unwrap();

        let err = service
            .update(
                scope,
                &patch(json!({"raid_threshold": 9, "mass_ping_threshold": -3})),
            )
            .await
            .unwrap_err();

        match err {
            ConfigError::Validation(issues) => {
                assert_eq!(issues.len(), 1);
                assert_eq!(issues[0].field, "mass_ping_threshold");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(service.get(scope).await.unwrap().raid_threshold, 7);
    }

    #[tokio::test]
    async fn test_guild_update_leaves_global_template_alone() {
        let service = service();
        service
            .update(ConfigScope::Guild(5), &patch(json!({"raid_window": 30})))
            .await
            .unwrap();

        assert_eq!(service.get(ConfigScope::Guild(5)).await.unwrap().raid_window, 30);
        assert_eq!(service.get(ConfigScope::Global).await.unwrap().raid_window, 60);
        assert_eq!(service.get(ConfigScope::Guild(6)).await.unwrap().raid_window, 60);
    }

    #[tokio::test]
    async fn test_unconfigured_guild_inherits_global_template() {
        let service = service();
        service
            .update(ConfigScope::Global, &patch(json!({"raid_window": 30})))
            .await
            .unwrap();

        let config = service.get(ConfigScope::Guild(5)).await.unwrap();
        assert_eq!(config.raid_window, 30);
        assert_eq!(config.guild_id, Some(5));
        assert_eq!(service.get(ConfigScope::Global).await.unwrap().guild_id, None);
    }

    #[tokio::test]
    async fn test_register_seeds_from_global_template() {
        let service = service();
        service
            .update(ConfigScope::Global, &patch(json!({"spam_threshold": 9})))
            .await
            .unwrap();

        assert!(service.register(4).await.unwrap());
        let config = service.get(ConfigScope::Guild(4)).await.unwrap();
        assert_eq!(config.spam_threshold, 9);
        assert_eq!(config.guild_id, Some(4));
    }

    #[tokio::test]
    async fn test_global_update_reaches_configured_guilds() {
        let service = service();
        service
            .update(
                ConfigScope::Guild(1),
                &patch(json!({"raid_threshold": 8, "raid_window": 20})),
            )
            .await
            .unwrap();

        service
            .update(ConfigScope::Global, &patch(json!({"raid_window": 90})))
            .await
            .unwrap();

        let config = service.get(ConfigScope::Guild(1)).await.unwrap();
        assert_eq!(config.raid_window, 90);
        // Fields the global patch didn't name keep the guild's own value.
        assert_eq!(config.raid_threshold, 8);
        assert_eq!(config.guild_id, Some(1));
    }

    #[tokio::test]
    async fn test_register_only_once() {
        let service = service();
        assert!(service.register(3).await.unwrap());
        service
            .update(ConfigScope::Guild(3), &patch(json!({"raid_threshold": 1})))
            .await
            .unwrap();
        assert!(!service.register(3).await.unwrap());
        assert_eq!(
            service.get(ConfigScope::Guild(3)).await.unwrap().raid_threshold,
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_fields() {
        let service = Arc::new(service());
        let scope = ConfigScope::Guild(8);

        let mut handles = Vec::new();
        for (field, value) in [
            ("raid_threshold", 11),
            ("raid_window", 12),
            ("spam_threshold", 13),
            ("mass_ping_threshold", 14),
        ] {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .update(scope, &patch(json!({ field: value })))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let config = service.get(scope).await.unwrap();
        assert_eq!(config.raid_threshold, 11);
        assert_eq!(config.raid_window, 12);
        assert_eq!(config.spam_threshold, 13);
        assert_eq!(config.mass_ping_threshold, 14);
    }
}
