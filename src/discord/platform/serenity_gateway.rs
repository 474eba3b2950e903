// PlatformGateway on top of serenity's cache and HTTP client.
//
// The web server starts before (or without) the Discord client, so the
// gateway begins detached and reports `Unavailable` until the `Ready` event
// hands it a cache and HTTP handle.

use crate::core::platform::{
    CategorySnapshot, ChannelKind, ChannelSnapshot, GuildStructure, GuildSummary,
    MemberBreakdown, MemberSummary, PlatformError, PlatformGateway, RestoreReport, RoleSnapshot,
};
use async_trait::async_trait;
use poise::serenity_prelude::{
    self as serenity, Cache, ChannelId, ChannelType, GuildId, Http, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId, UserId,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

const RESTORE_REASON: &str = "Restore from backup";

pub struct SerenityGateway {
    handles: OnceLock<(Arc<Cache>, Arc<Http>)>,
    connected: AtomicBool,
    verification_role: Option<u64>,
    pending_role: Option<u64>,
}

impl SerenityGateway {
    pub fn new(verification_role: Option<u64>, pending_role: Option<u64>) -> Self {
        Self {
            handles: OnceLock::new(),
            connected: AtomicBool::new(false),
            verification_role,
            pending_role,
        }
    }

    /// Hook the gateway up to a live client. Later calls (reconnects) are no-ops.
    pub fn attach(&self, ctx: &serenity::Context) {
        let _ = self
            .handles
            .set((Arc::clone(&ctx.cache), Arc::clone(&ctx.http)));
        self.set_connected(true);
    }

    pub fn set_connected(&self, connected: bool) {
        let was = self.connected.swap(connected, Ordering::SeqCst);
        if was != connected {
            tracing::info!(connected, "Discord connection state changed");
        }
    }

    fn handles(&self) -> Result<(&Arc<Cache>, &Arc<Http>), PlatformError> {
        if !self.is_connected() {
            return Err(PlatformError::Unavailable);
        }
        self.handles
            .get()
            .map(|(cache, http)| (cache, http))
            .ok_or(PlatformError::Unavailable)
    }
}

/// Snowflake 0 is never valid, and serenity's id constructors reject it.
fn guild_id(id: u64) -> Result<GuildId, PlatformError> {
    if id == 0 {
        return Err(PlatformError::UnknownGuild(id));
    }
    Ok(GuildId::new(id))
}

fn request_error(e: serenity::Error) -> PlatformError {
    PlatformError::Request(e.to_string())
}

/// The `@everyone` overwrite a channel should carry, keeping every bit other
/// than SEND_MESSAGES as it was.
fn lock_overwrite(
    existing: Option<(Permissions, Permissions)>,
    locked: bool,
) -> (Permissions, Permissions) {
    let (mut allow, mut deny) = existing.unwrap_or((Permissions::empty(), Permissions::empty()));
    if locked {
        allow.remove(Permissions::SEND_MESSAGES);
        deny.insert(Permissions::SEND_MESSAGES);
    } else {
        deny.remove(Permissions::SEND_MESSAGES);
    }
    (allow, deny)
}

/// Split human members into verified and pending. With a pending role, its
/// holders are pending; otherwise anyone without the verification role is.
/// With neither role configured every human counts as verified.
fn split_members<'a>(
    member_roles: impl Iterator<Item = &'a [RoleId]>,
    verification_role: Option<u64>,
    pending_role: Option<u64>,
) -> MemberBreakdown {
    let mut breakdown = MemberBreakdown::default();
    for roles in member_roles {
        let has = |role: u64| roles.iter().any(|r| r.get() == role);
        let pending = match (pending_role, verification_role) {
            (Some(pending), _) => has(pending),
            (None, Some(verified)) => !has(verified),
            (None, None) => false,
        };
        if pending {
            breakdown.pending += 1;
        } else {
            breakdown.verified += 1;
        }
    }
    breakdown
}

fn format_joined(joined_at: Option<serenity::Timestamp>) -> String {
    joined_at
        .and_then(|t| chrono::DateTime::from_timestamp(t.unix_timestamp(), 0))
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[async_trait]
impl PlatformGateway for SerenityGateway {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn guilds(&self) -> Result<Vec<GuildSummary>, PlatformError> {
        let (cache, _) = self.handles()?;
        let mut guilds: Vec<GuildSummary> = cache
            .guilds()
            .into_iter()
            .filter_map(|id| {
                cache.guild(id).map(|g| GuildSummary {
                    id: id.get(),
                    name: g.name.clone(),
                    member_count: g.member_count,
                })
            })
            .collect();
        guilds.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(guilds)
    }

    async fn member_breakdown(&self, id: u64) -> Result<MemberBreakdown, PlatformError> {
        let (cache, _) = self.handles()?;
        let guild = cache
            .guild(guild_id(id)?)
            .ok_or(PlatformError::UnknownGuild(id))?;

        Ok(split_members(
            guild
                .members
                .values()
                .filter(|m| !m.user.bot)
                .map(|m| m.roles.as_slice()),
            self.verification_role,
            self.pending_role,
        ))
    }

    async fn members(&self, id: u64, limit: usize) -> Result<Vec<MemberSummary>, PlatformError> {
        let (cache, _) = self.handles()?;
        let guild = cache
            .guild(guild_id(id)?)
            .ok_or(PlatformError::UnknownGuild(id))?;

        let mut members: Vec<&serenity::Member> = guild.members.values().collect();
        members.sort_by_key(|m| m.joined_at.map(|t| t.unix_timestamp()));

        Ok(members
            .into_iter()
            .take(limit)
            .map(|m| MemberSummary {
                id: m.user.id.get(),
                name: m.user.name.clone(),
                discriminator: m
                    .user
                    .discriminator
                    .map(|d| format!("{:04}", d.get()))
                    .unwrap_or_else(|| "0".to_string()),
                avatar: m.user.face(),
                joined_at: format_joined(m.joined_at),
                roles: m
                    .roles
                    .iter()
                    .filter_map(|r| guild.roles.get(r).map(|role| role.name.clone()))
                    .collect(),
                is_bot: m.user.bot,
            })
            .collect())
    }

    async fn snapshot_structure(&self, id: u64) -> Result<GuildStructure, PlatformError> {
        let (cache, _) = self.handles()?;
        let gid = guild_id(id)?;
        let guild = cache.guild(gid).ok_or(PlatformError::UnknownGuild(id))?;
        let everyone = gid.everyone_role();

        let mut roles: Vec<RoleSnapshot> = guild
            .roles
            .values()
            .filter(|r| r.id != everyone && !r.managed)
            .map(|r| RoleSnapshot {
                id: r.id.get(),
                name: r.name.clone(),
                colour: r.colour.0,
                permissions: r.permissions.bits(),
                position: r.position,
                hoist: r.hoist,
                mentionable: r.mentionable,
            })
            .collect();
        roles.sort_by_key(|r| r.position);

        let mut categories = Vec::new();
        let mut channels = Vec::new();
        for channel in guild.channels.values() {
            let kind = match channel.kind {
                ChannelType::Category => {
                    categories.push(CategorySnapshot {
                        id: channel.id.get(),
                        name: channel.name.clone(),
                        position: channel.position,
                    });
                    continue;
                }
                ChannelType::Text => ChannelKind::Text,
                ChannelType::Voice => ChannelKind::Voice,
                _ => ChannelKind::Other,
            };
            channels.push(ChannelSnapshot {
                id: channel.id.get(),
                name: channel.name.clone(),
                kind,
                category_id: channel.parent_id.map(|p| p.get()),
                position: channel.position,
            });
        }
        categories.sort_by_key(|c| c.position);
        channels.sort_by_key(|c| c.position);

        let role_memberships: BTreeMap<u64, Vec<u64>> = guild
            .members
            .values()
            .filter(|m| !m.user.bot && !m.roles.is_empty())
            .map(|m| (m.user.id.get(), m.roles.iter().map(|r| r.get()).collect()))
            .collect();

        Ok(GuildStructure {
            name: guild.name.clone(),
            roles,
            categories,
            channels,
            role_memberships,
        })
    }

    async fn set_channels_locked(&self, id: u64, locked: bool) -> Result<usize, PlatformError> {
        let (cache, http) = self.handles()?;
        let gid = guild_id(id)?;
        let everyone = gid.everyone_role();

        // Collect everything up front: cache references can't be held across awaits.
        let targets: Vec<(ChannelId, Option<(Permissions, Permissions)>)> = {
            let guild = cache.guild(gid).ok_or(PlatformError::UnknownGuild(id))?;
            guild
                .channels
                .values()
                .filter(|c| c.kind == ChannelType::Text)
                .map(|c| {
                    let existing = c
                        .permission_overwrites
                        .iter()
                        .find(|o| o.kind == PermissionOverwriteType::Role(everyone))
                        .map(|o| (o.allow, o.deny));
                    (c.id, existing)
                })
                .collect()
        };

        let mut updated = 0;
        let mut last_error = None;
        for (channel_id, existing) in targets {
            let (allow, deny) = lock_overwrite(existing, locked);
            let overwrite = PermissionOverwrite {
                allow,
                deny,
                kind: PermissionOverwriteType::Role(everyone),
            };
            match channel_id.create_permission(http, overwrite).await {
                Ok(()) => updated += 1,
                Err(e) => {
                    tracing::warn!(guild_id = id, channel_id = channel_id.get(), error = %e, "Failed to update channel permissions");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if updated == 0 => Err(request_error(e)),
            _ => Ok(updated),
        }
    }

    async fn restore_structure(
        &self,
        id: u64,
        structure: &GuildStructure,
    ) -> Result<RestoreReport, PlatformError> {
        let (cache, http) = self.handles()?;
        let gid = guild_id(id)?;
        let mut report = RestoreReport::default();

        let (current_name, mut roles_by_name, mut categories_by_name, channel_names, members) = {
            let guild = cache.guild(gid).ok_or(PlatformError::UnknownGuild(id))?;
            let roles: HashMap<String, RoleId> = guild
                .roles
                .values()
                .map(|r| (r.name.clone(), r.id))
                .collect();
            let categories: HashMap<String, ChannelId> = guild
                .channels
                .values()
                .filter(|c| c.kind == ChannelType::Category)
                .map(|c| (c.name.clone(), c.id))
                .collect();
            let channel_names: HashSet<String> = guild
                .channels
                .values()
                .filter(|c| c.kind != ChannelType::Category)
                .map(|c| c.name.clone())
                .collect();
            let members: HashMap<u64, Vec<RoleId>> = guild
                .members
                .values()
                .map(|m| (m.user.id.get(), m.roles.clone()))
                .collect();
            (guild.name.clone(), roles, categories, channel_names, members)
        };

        if !structure.name.is_empty() && structure.name != current_name {
            let edit = serenity::EditGuild::new()
                .name(&structure.name)
                .audit_log_reason(RESTORE_REASON);
            if let Err(e) = gid.edit(http, edit).await {
                tracing::warn!(guild_id = id, error = %e, "Failed to restore guild name");
            }
        }

        for role in &structure.roles {
            if roles_by_name.contains_key(&role.name) {
                continue;
            }
            let builder = serenity::EditRole::new()
                .name(&role.name)
                .colour(role.colour)
                .permissions(Permissions::from_bits_truncate(role.permissions))
                .hoist(role.hoist)
                .mentionable(role.mentionable)
                .audit_log_reason(RESTORE_REASON);
            match gid.create_role(http, builder).await {
                Ok(created) => {
                    roles_by_name.insert(created.name.clone(), created.id);
                    report.roles_created += 1;
                }
                Err(e) => tracing::warn!(guild_id = id, role = %role.name, error = %e, "Failed to recreate role"),
            }
        }

        for category in &structure.categories {
            if categories_by_name.contains_key(&category.name) {
                continue;
            }
            let builder = serenity::CreateChannel::new(&category.name)
                .kind(ChannelType::Category)
                .position(category.position)
                .audit_log_reason(RESTORE_REASON);
            match gid.create_channel(http, builder).await {
                Ok(created) => {
                    categories_by_name.insert(created.name.clone(), created.id);
                    report.categories_created += 1;
                }
                Err(e) => tracing::warn!(guild_id = id, category = %category.name, error = %e, "Failed to recreate category"),
            }
        }

        let category_names: HashMap<u64, &str> = structure
            .categories
            .iter()
            .map(|c| (c.id, c.name.as_str()))
            .collect();
        for channel in &structure.channels {
            let kind = match channel.kind {
                ChannelKind::Text => ChannelType::Text,
                ChannelKind::Voice => ChannelType::Voice,
                ChannelKind::Other => continue,
            };
            if channel_names.contains(&channel.name) {
                continue;
            }
            let mut builder = serenity::CreateChannel::new(&channel.name)
                .kind(kind)
                .position(channel.position)
                .audit_log_reason(RESTORE_REASON);
            let parent = channel
                .category_id
                .and_then(|c| category_names.get(&c))
                .and_then(|name| categories_by_name.get(*name));
            if let Some(parent) = parent {
                builder = builder.category(*parent);
            }
            match gid.create_channel(http, builder).await {
                Ok(_) => report.channels_created += 1,
                Err(e) => tracing::warn!(guild_id = id, channel = %channel.name, error = %e, "Failed to recreate channel"),
            }
        }

        let saved_role_names: HashMap<u64, &str> = structure
            .roles
            .iter()
            .map(|r| (r.id, r.name.as_str()))
            .collect();
        for (user_id, saved_roles) in &structure.role_memberships {
            let Some(current) = members.get(user_id) else {
                continue;
            };
            let missing: Vec<RoleId> = saved_roles
                .iter()
                .filter_map(|r| saved_role_names.get(r))
                .filter_map(|name| roles_by_name.get(*name).copied())
                .filter(|r| !current.contains(r))
                .collect();
            if missing.is_empty() || *user_id == 0 {
                continue;
            }

            let mut ok = true;
            for role in missing {
                if let Err(e) = http
                    .add_member_role(gid, UserId::new(*user_id), role, Some(RESTORE_REASON))
                    .await
                {
                    tracing::warn!(guild_id = id, user_id, error = %e, "Failed to restore member role");
                    ok = false;
                }
            }
            if ok {
                report.members_updated += 1;
            }
        }

        Ok(report)
    }
}
