// Dashboard API handlers, one module per resource.

pub mod config;
pub mod guilds;
pub mod health;
pub mod logs;
pub mod members;
pub mod moderation;
pub mod stats;

use crate::core::guild_locks::ConfigScope;
use crate::core::snowflake;
use crate::web::error::ApiError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query};
use serde::Deserialize;

/// `?guild_id=` as sent by the dashboard. Missing or empty means global.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeQuery {
    pub guild_id: Option<String>,
}

impl ScopeQuery {
    pub fn scope(&self) -> Result<ConfigScope, ApiError> {
        let guild_id = snowflake::parse_optional(self.guild_id.as_deref().unwrap_or(""))
            .map_err(|reason| ApiError::invalid("guild_id", reason))?;
        Ok(guild_id.into())
    }
}

/// A JSON body carrying only the scope.
#[derive(Debug, Default, Deserialize)]
pub struct ScopeBody {
    #[serde(default, deserialize_with = "snowflake::deserialize_optional")]
    pub guild_id: Option<u64>,
}

/// Unwrap a JSON body, turning axum's rejection into our 400.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::malformed(rejection.body_text()))
}

/// Same as [`body`] for query strings.
pub fn query<T>(payload: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    payload
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::malformed(rejection.body_text()))
}
