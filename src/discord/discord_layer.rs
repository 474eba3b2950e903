// Discord layer - slash commands, gateway events and the serenity-backed
// platform adapter.

use crate::core::logging::LogRegistry;
use crate::infra::{ConfigService, ModerationControl, ProtectionControl};
use std::sync::Arc;

#[path = "platform/mod.rs"]
pub mod platform;

#[path = "events.rs"]
pub mod events;

#[path = "moderation/mod.rs"]
pub mod moderation;

/// Shared state handed to every command and event handler.
pub struct Data {
    pub config: Arc<ConfigService>,
    pub moderation: Arc<ModerationControl>,
    pub protection: Arc<ProtectionControl>,
    pub gateway: Arc<platform::SerenityGateway>,
    pub logs: Arc<LogRegistry>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
