// Implementations of the guild config store.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryGuildConfigStore;
pub use sqlite_store::SqliteGuildConfigStore;
