// In-memory GuildConfigStore. Used by tests and handy for running the
// dashboard without a database.

use crate::core::guild_config::{ConfigError, GuildConfig, GuildConfigStore};
use crate::core::guild_locks::ConfigScope;
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Default)]
pub struct InMemoryGuildConfigStore {
    configs: DashMap<ConfigScope, GuildConfig>,
}

impl InMemoryGuildConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GuildConfigStore for InMemoryGuildConfigStore {
    async fn load(&self, scope: ConfigScope) -> Result<Option<GuildConfig>, ConfigError> {
        Ok(self.configs.get(&scope).map(|entry| entry.clone()))
    }

    async fn save(&self, scope: ConfigScope, config: &GuildConfig) -> Result<(), ConfigError> {
        self.configs.insert(scope, config.clone());
        Ok(())
    }

    async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError> {
        Ok(self
            .configs
            .iter()
            .filter_map(|entry| entry.key().guild_id())
            .collect())
    }
}
