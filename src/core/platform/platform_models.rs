// Platform-facing data, stripped of any Discord SDK types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One guild the bot is a member of.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuildSummary {
    #[serde(serialize_with = "crate::core::snowflake::serialize")]
    pub id: u64,
    pub name: String,
    pub member_count: u64,
}

/// Human members of a guild split by verification state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberBreakdown {
    pub verified: u64,
    pub pending: u64,
}

/// A row in the dashboard's member table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSummary {
    #[serde(serialize_with = "crate::core::snowflake::serialize")]
    pub id: u64,
    pub name: String,
    pub discriminator: String,
    pub avatar: String,
    /// `YYYY-MM-DD`, or `Unknown` when the platform didn't report it.
    pub joined_at: String,
    pub roles: Vec<String>,
    pub is_bot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSnapshot {
    pub id: u64,
    pub name: String,
    pub colour: u32,
    pub permissions: u64,
    pub position: u16,
    pub hoist: bool,
    pub mentionable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySnapshot {
    pub id: u64,
    pub name: String,
    pub position: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Text,
    Voice,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub id: u64,
    pub name: String,
    pub kind: ChannelKind,
    pub category_id: Option<u64>,
    pub position: u16,
}

/// Everything about a guild's layout that a restore can put back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildStructure {
    pub name: String,
    pub roles: Vec<RoleSnapshot>,
    pub categories: Vec<CategorySnapshot>,
    pub channels: Vec<ChannelSnapshot>,
    /// User ID -> role IDs held when the snapshot was taken (`@everyone` excluded).
    pub role_memberships: BTreeMap<u64, Vec<u64>>,
}

/// What a structural restore actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub roles_created: usize,
    pub categories_created: usize,
    pub channels_created: usize,
    pub members_updated: usize,
}
