// Messaging-platform port.

pub mod platform_gateway;
pub mod platform_models;

#[cfg(test)]
pub mod fake_gateway;

pub use platform_gateway::*;
pub use platform_models::*;
