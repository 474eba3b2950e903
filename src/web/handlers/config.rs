use super::{body, query, ScopeQuery};
use crate::core::guild_config::{GuildConfig, GuildConfigPatch};
use crate::core::snowflake;
use crate::web::error::ApiError;
use crate::web::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Query, State};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, deserialize_with = "snowflake::deserialize_optional")]
    guild_id: Option<u64>,
    #[serde(flatten)]
    patch: GuildConfigPatch,
}

pub async fn get_config(
    State(state): State<AppState>,
    params: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<GuildConfig>, ApiError> {
    let scope = query(params)?.scope()?;
    Ok(Json(state.config.get(scope).await?))
}

pub async fn update_config(
    State(state): State<AppState>,
    payload: Result<Json<ConfigUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let update = body(payload)?;
    state
        .config
        .update(update.guild_id.into(), &update.patch)
        .await?;
    Ok(Json(json!({})))
}
