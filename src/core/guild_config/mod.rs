// Core guild configuration module.

pub mod guild_config_models;
pub mod guild_config_service;

pub use guild_config_models::*;
pub use guild_config_service::*;
