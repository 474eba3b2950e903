use super::{body, ScopeBody};
use crate::core::moderation::RaidAction;
use crate::core::snowflake;
use crate::web::error::ApiError;
use crate::web::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use serde_json::Number;

#[derive(Debug, Serialize)]
pub struct ActionReply {
    message: String,
}

impl From<String> for ActionReply {
    fn from(message: String) -> Self {
        Self { message }
    }
}

#[derive(Debug, Deserialize)]
pub struct RaidModeRequest {
    action: Option<String>,
    #[serde(default, deserialize_with = "snowflake::deserialize_optional")]
    guild_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LockdownRequest {
    minutes: Option<Number>,
    #[serde(default, deserialize_with = "snowflake::deserialize_optional")]
    guild_id: Option<u64>,
}

/// Minutes as a signed integer; range checks happen in the controller.
fn whole_minutes(minutes: Option<Number>) -> Result<Option<i64>, ApiError> {
    let Some(minutes) = minutes else {
        return Ok(None);
    };
    if let Some(m) = minutes.as_i64() {
        return Ok(Some(m));
    }
    if minutes.is_u64() {
        return Err(ApiError::invalid("minutes", "is too large"));
    }
    Err(ApiError::invalid("minutes", "must be a whole number"))
}

pub async fn raid_mode(
    State(state): State<AppState>,
    payload: Result<Json<RaidModeRequest>, JsonRejection>,
) -> Result<Json<ActionReply>, ApiError> {
    let request = body(payload)?;
    let action = request
        .action
        .as_deref()
        .ok_or_else(|| ApiError::invalid("action", "is required"))?
        .parse::<RaidAction>()
        .map_err(|reason| ApiError::invalid("action", reason))?;

    let message = state
        .moderation
        .raid_mode(request.guild_id.into(), action)
        .await?;
    Ok(Json(message.into()))
}

pub async fn lockdown(
    State(state): State<AppState>,
    payload: Result<Json<LockdownRequest>, JsonRejection>,
) -> Result<Json<ActionReply>, ApiError> {
    let request = body(payload)?;
    let minutes = whole_minutes(request.minutes)?;

    let message = state
        .moderation
        .lockdown(request.guild_id.into(), minutes)
        .await?;
    Ok(Json(message.into()))
}

pub async fn cancel_lockdown(
    State(state): State<AppState>,
    payload: Result<Json<ScopeBody>, JsonRejection>,
) -> Result<Json<ActionReply>, ApiError> {
    let request = body(payload)?;
    let message = state.moderation.cancel(request.guild_id.into()).await?;
    Ok(Json(message.into()))
}

pub async fn backup(
    State(state): State<AppState>,
    payload: Result<Json<ScopeBody>, JsonRejection>,
) -> Result<Json<ActionReply>, ApiError> {
    let request = body(payload)?;
    let message = state
        .moderation
        .backup_scope(request.guild_id.into())
        .await?;
    Ok(Json(message.into()))
}

pub async fn restore(
    State(state): State<AppState>,
    payload: Result<Json<ScopeBody>, JsonRejection>,
) -> Result<Json<ActionReply>, ApiError> {
    let request = body(payload)?;
    let message = state
        .moderation
        .restore_scope(request.guild_id.into())
        .await?;
    Ok(Json(message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_minutes() {
        assert_eq!(whole_minutes(None).unwrap(), None);
        assert_eq!(whole_minutes(Some(Number::from(15))).unwrap(), Some(15));
        assert_eq!(whole_minutes(Some(Number::from(-2))).unwrap(), Some(-2));
        assert!(whole_minutes(Some(Number::from_f64(2.5).unwrap())).is_err());
        assert!(whole_minutes(Some(Number::from(u64::MAX))).is_err());
    }
}
