// Per-scope mutual exclusion.
//
// Every mutation of a guild's config or moderation state happens while the
// caller holds that guild's `ScopeGuard`. Guilds never share a lock, so a
// lockdown in one guild can't stall a config save in another.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// What a piece of configuration or a request applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigScope {
    /// The dashboard's global template (no guild selected).
    Global,
    Guild(u64),
}

impl ConfigScope {
    pub fn guild_id(&self) -> Option<u64> {
        match self {
            ConfigScope::Global => None,
            ConfigScope::Guild(id) => Some(*id),
        }
    }
}

impl From<Option<u64>> for ConfigScope {
    fn from(guild_id: Option<u64>) -> Self {
        guild_id.map_or(ConfigScope::Global, ConfigScope::Guild)
    }
}

impl std::fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigScope::Global => write!(f, "global"),
            ConfigScope::Guild(id) => write!(f, "guild {}", id),
        }
    }
}

/// Proof that the holder has exclusive access to one scope.
pub struct ScopeGuard {
    scope: ConfigScope,
    _guard: OwnedMutexGuard<()>,
}

impl ScopeGuard {
    pub fn scope(&self) -> ConfigScope {
        self.scope
    }
}

#[derive(Default)]
pub struct GuildLocks {
    locks: DashMap<ConfigScope, Arc<Mutex<()>>>,
}

impl GuildLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `scope`.
    pub async fn acquire(&self, scope: ConfigScope) -> ScopeGuard {
        // Clone the Arc out so the DashMap shard isn't held across the await.
        let lock = self.locks.entry(scope).or_default().clone();
        ScopeGuard {
            scope,
            _guard: lock.lock_owned().await,
        }
    }
}
