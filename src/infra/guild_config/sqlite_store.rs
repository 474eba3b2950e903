use crate::core::guild_config::{ConfigError, GuildConfig, GuildConfigStore};
use crate::core::guild_locks::ConfigScope;
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

/// Stores each scope's config as one JSON document keyed by scope.
pub struct SqliteGuildConfigStore {
    pool: Pool<Sqlite>,
}

impl SqliteGuildConfigStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_configs (
                scope_key TEXT PRIMARY KEY,
                config TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// `global`, or the guild id as a string.
fn scope_key(scope: ConfigScope) -> String {
    match scope {
        ConfigScope::Global => "global".to_string(),
        ConfigScope::Guild(id) => id.to_string(),
    }
}

#[async_trait]
impl GuildConfigStore for SqliteGuildConfigStore {
    async fn load(&self, scope: ConfigScope) -> Result<Option<GuildConfig>, ConfigError> {
        let row = sqlx::query("SELECT config FROM guild_configs WHERE scope_key = ?")
            .bind(scope_key(scope))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let json: String = row.get("config");
        let config = serde_json::from_str(&json).map_err(|e| {
            ConfigError::StorageError(format!("stored config for {} is corrupt: {}", scope, e))
        })?;
        Ok(Some(config))
    }

    async fn save(&self, scope: ConfigScope, config: &GuildConfig) -> Result<(), ConfigError> {
        let json =
            serde_json::to_string(config).map_err(|e| ConfigError::StorageError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO guild_configs (scope_key, config, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(scope_key) DO UPDATE SET
                config = excluded.config,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(scope_key(scope))
        .bind(json)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ConfigError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError> {
        let rows = sqlx::query("SELECT scope_key FROM guild_configs WHERE scope_key != 'global'")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;

        Ok(rows
            .iter()
            .filter_map(|row| row.get::<String, _>("scope_key").parse().ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::sqlite;

    async fn store() -> SqliteGuildConfigStore {
        let store = SqliteGuildConfigStore::new(sqlite::connect_in_memory().await);
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_missing_scope_loads_none() {
        let store = store().await;
        assert!(store.load(ConfigScope::Guild(1)).await.unwrap().is_none());
        assert!(store.load(ConfigScope::Global).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_config() {
        let store = store().await;
        let scope = ConfigScope::Guild(42);

        let mut config = GuildConfig::defaults_for(Some(42));
        store.save(scope, &config).await.unwrap();

        config.raid_threshold = 12;
        config.bad_words.insert("scam".to_string());
        store.save(scope, &config).await.unwrap();

        assert_eq!(store.load(scope).await.unwrap(), Some(config));
        assert!(store.load(ConfigScope::Global).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guild_ids_skip_global_template() {
        let store = store().await;
        store
            .save(ConfigScope::Global, &GuildConfig::defaults_for(None))
            .await
            .unwrap();
        for id in [3, 9] {
            store
                .save(ConfigScope::Guild(id), &GuildConfig::defaults_for(Some(id)))
                .await
                .unwrap();
        }

        let mut ids = store.guild_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec![3, 9]);
    }

    #[tokio::test]
    async fn test_config_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guard.db");

        let mut config = GuildConfig::defaults_for(None);
        config.use_math_captcha = true;
        {
            let store = SqliteGuildConfigStore::new(sqlite::connect(&path).await.unwrap());
            store.migrate().await.unwrap();
            store.save(ConfigScope::Global, &config).await.unwrap();
        }

        let store = SqliteGuildConfigStore::new(sqlite::connect(&path).await.unwrap());
        store.migrate().await.unwrap();
        assert_eq!(store.load(ConfigScope::Global).await.unwrap(), Some(config));
    }
}
