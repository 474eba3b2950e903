// Core moderation module - raid mode, lockdown and backups.
// Following the same pattern as the config module.

pub mod moderation_models;
pub mod moderation_service;
pub mod moderation_state;

pub use moderation_models::*;
pub use moderation_service::*;
pub use moderation_state::*;
