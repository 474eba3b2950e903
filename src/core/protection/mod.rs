// Core protection module - automatic raid and nuke detection, and message
// screening against the guild's configured limits.

pub mod message_screen;
pub mod protection_models;
pub mod protection_service;
pub mod raid_detector;

pub use message_screen::MessageScreen;
pub use protection_models::*;
pub use protection_service::*;
pub use raid_detector::RaidDetector;
