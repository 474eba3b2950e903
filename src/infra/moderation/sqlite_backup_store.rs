use crate::core::moderation::{ActionError, BackupSnapshot, BackupStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

/// One row per guild holding its most recent backup.
pub struct SqliteBackupStore {
    pool: Pool<Sqlite>,
}

impl SqliteBackupStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS guild_backups (
                guild_id INTEGER PRIMARY KEY,
                created_at TEXT NOT NULL,
                payload TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl BackupStore for SqliteBackupStore {
    async fn save(&self, snapshot: &BackupSnapshot) -> Result<(), ActionError> {
        sqlx::query(
            r#"
            INSERT INTO guild_backups (guild_id, created_at, payload)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                created_at = excluded.created_at,
                payload = excluded.payload
            "#,
        )
        .bind(snapshot.guild_id as i64)
        .bind(snapshot.created_at.to_rfc3339())
        .bind(snapshot.payload.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| ActionError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn latest(&self, guild_id: u64) -> Result<Option<BackupSnapshot>, ActionError> {
        let row = sqlx::query("SELECT created_at, payload FROM guild_backups WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ActionError::StorageError(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let created_at: String = row.get("created_at");
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| ActionError::StorageError(format!("bad backup timestamp: {}", e)))?
            .with_timezone(&Utc);

        // A payload that isn't even JSON can't be restored; report it the same
        // way as one that fails schema checks.
        let payload: String = row.get("payload");
        let payload = serde_json::from_str(&payload)
            .map_err(|e| ActionError::Restore(format!("backup is not valid JSON: {}", e)))?;

        Ok(Some(BackupSnapshot {
            guild_id,
            created_at,
            payload,
        }))
    }
}
