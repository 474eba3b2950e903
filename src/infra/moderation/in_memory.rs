use crate::core::moderation::{
    ActionError, BackupSnapshot, BackupStore, GuildModeration, ModerationStore,
};
use async_trait::async_trait;
use dashmap::DashMap;

/// Keeps the latest backup of each guild in memory.
#[derive(Default)]
pub struct InMemoryBackupStore {
    snapshots: DashMap<u64, BackupSnapshot>,
}

impl InMemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BackupStore for InMemoryBackupStore {
    async fn save(&self, snapshot: &BackupSnapshot) -> Result<(), ActionError> {
        self.snapshots.insert(snapshot.guild_id, snapshot.clone());
        Ok(())
    }

    async fn latest(&self, guild_id: u64) -> Result<Option<BackupSnapshot>, ActionError> {
        Ok(self.snapshots.get(&guild_id).map(|entry| entry.clone()))
    }
}

#[derive(Default)]
pub struct InMemoryModerationStore {
    states: DashMap<u64, GuildModeration>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ModerationStore for InMemoryModerationStore {
    async fn save(&self, guild_id: u64, state: &GuildModeration) -> Result<(), ActionError> {
        self.states.insert(guild_id, *state);
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<(u64, GuildModeration)>, ActionError> {
        Ok(self
            .states
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect())
    }
}
