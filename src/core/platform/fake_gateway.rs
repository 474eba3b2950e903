// In-memory platform used by tests across the crate.

use super::platform_gateway::{PlatformError, PlatformGateway};
use super::platform_models::{
    GuildStructure, GuildSummary, MemberBreakdown, MemberSummary, RestoreReport,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Clone)]
struct FakeGuild {
    summary: GuildSummary,
    breakdown: MemberBreakdown,
    structure: GuildStructure,
    members: Vec<MemberSummary>,
}

pub struct FakeGateway {
    connected: AtomicBool,
    guilds: Mutex<BTreeMap<u64, FakeGuild>>,
    /// Every `set_channels_locked` call, in order.
    pub lock_calls: Mutex<Vec<(u64, bool)>>,
    /// Guilds whose structure was restored, in order.
    pub restore_calls: Mutex<Vec<u64>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            guilds: Mutex::new(BTreeMap::new()),
            lock_calls: Mutex::new(Vec::new()),
            restore_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_guild(self, id: u64, name: &str, verified: u64, pending: u64) -> Self {
        let members = (0..verified + pending)
            .map(|n| MemberSummary {
                id: id * 1000 + n,
                name: format!("member{}", n),
                discriminator: "0".to_string(),
                avatar: String::new(),
                joined_at: "2024-01-01".to_string(),
                roles: Vec::new(),
                is_bot: false,
            })
            .collect();

        self.guilds.lock().unwrap().insert(
            id,
            FakeGuild {
                summary: GuildSummary {
                    id,
                    name: name.to_string(),
                    member_count: verified + pending,
                },
                breakdown: MemberBreakdown { verified, pending },
                structure: GuildStructure {
                    name: name.to_string(),
                    ..Default::default()
                },
                members,
            },
        );
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn lock_calls(&self) -> Vec<(u64, bool)> {
        self.lock_calls.lock().unwrap().clone()
    }

    fn guild(&self, guild_id: u64) -> Result<FakeGuild, PlatformError> {
        if !self.is_connected() {
            return Err(PlatformError::Unavailable);
        }
        self.guilds
            .lock()
            .unwrap()
            .get(&guild_id)
            .cloned()
            .ok_or(PlatformError::UnknownGuild(guild_id))
    }
}

#[async_trait]
impl PlatformGateway for FakeGateway {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn guilds(&self) -> Result<Vec<GuildSummary>, PlatformError> {
        if !self.is_connected() {
            return Err(PlatformError::Unavailable);
        }
        Ok(self
            .guilds
            .lock()
            .unwrap()
            .values()
            .map(|g| g.summary.clone())
            .collect())
    }

    async fn member_breakdown(&self, guild_id: u64) -> Result<MemberBreakdown, PlatformError> {
        Ok(self.guild(guild_id)?.breakdown)
    }

    async fn members(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<MemberSummary>, PlatformError> {
        let mut members = self.guild(guild_id)?.members;
        members.truncate(limit);
        Ok(members)
    }

    async fn snapshot_structure(&self, guild_id: u64) -> Result<GuildStructure, PlatformError> {
        Ok(self.guild(guild_id)?.structure)
    }

    async fn set_channels_locked(
        &self,
        guild_id: u64,
        locked: bool,
    ) -> Result<usize, PlatformError> {
        self.guild(guild_id)?;
        self.lock_calls.lock().unwrap().push((guild_id, locked));
        Ok(1)
    }

    async fn restore_structure(
        &self,
        guild_id: u64,
        _structure: &GuildStructure,
    ) -> Result<RestoreReport, PlatformError> {
        self.guild(guild_id)?;
        self.restore_calls.lock().unwrap().push(guild_id);
        Ok(RestoreReport::default())
    }
}
