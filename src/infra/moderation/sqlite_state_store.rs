use crate::core::moderation::{ActionError, GuildModeration, ModerationStore};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

/// One row per guild holding its raid mode and lockdown as JSON.
pub struct SqliteModerationStore {
    pool: Pool<Sqlite>,
}

impl SqliteModerationStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_moderation (
                guild_id INTEGER PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ModerationStore for SqliteModerationStore {
    async fn save(&self, guild_id: u64, state: &GuildModeration) -> Result<(), ActionError> {
        let json =
            serde_json::to_string(state).map_err(|e| ActionError::StorageError(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO guild_moderation (guild_id, state, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(guild_id as i64)
        .bind(json)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| ActionError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<(u64, GuildModeration)>, ActionError> {
        let rows = sqlx::query("SELECT guild_id, state FROM guild_moderation")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ActionError::StorageError(e.to_string()))?;

        let mut states = Vec::with_capacity(rows.len());
        for row in rows {
            let guild_id: i64 = row.get("guild_id");
            let json: String = row.get("state");
            match serde_json::from_str(&json) {
                Ok(state) => states.push((guild_id as u64, state)),
                Err(e) => {
                    tracing::warn!(guild_id, error = %e, "Skipping corrupt moderation state")
                }
            }
        }
        Ok(states)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::{LockdownState, RaidModeState};
    use crate::infra::sqlite;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guard.db");
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let state = GuildModeration {
            raid_mode: RaidModeState {
                active: true,
                activated_at: Some(at),
            },
            lockdown: LockdownState::until(at + chrono::Duration::minutes(60)),
        };
        {
            let store = SqliteModerationStore::new(sqlite::connect(&path).await.unwrap());
            store.migrate().await.unwrap();
            store.save(4, &GuildModeration::default()).await.unwrap();
            store.save(4, &state).await.unwrap();
        }

        let store = SqliteModerationStore::new(sqlite::connect(&path).await.unwrap());
        store.migrate().await.unwrap();
        assert_eq!(store.load_all().await.unwrap(), vec![(4, state)]);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_skipped() {
        let store = SqliteModerationStore::new(sqlite::connect_in_memory().await);
        store.migrate().await.unwrap();
        store.save(1, &GuildModeration::default()).await.unwrap();
        sqlx::query("INSERT INTO guild_moderation (guild_id, state, updated_at) VALUES (?, ?, ?)")
            .bind(2_i64)
            .bind("{broken")
            .bind(Utc::now().to_rfc3339())
            .execute(&store.pool)
            .await
            .unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].0, 1);
    }
}
