// Discord side of moderation: slash commands and message screening.

pub mod commands;
pub mod message_handler;
