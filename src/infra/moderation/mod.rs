// Implementations of the backup and moderation state stores.

pub mod in_memory;
pub mod sqlite_backup_store;
pub mod sqlite_state_store;

pub use in_memory::{InMemoryBackupStore, InMemoryModerationStore};
pub use sqlite_backup_store::SqliteBackupStore;
pub use sqlite_state_store::SqliteModerationStore;
