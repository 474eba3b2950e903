use super::query;
use crate::core::logging::{LogEntry, LogFilter};
use crate::core::snowflake;
use crate::web::error::ApiError;
use crate::web::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Query, State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    guild_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogList {
    logs: Vec<LogEntry>,
}

pub async fn list_logs(
    State(state): State<AppState>,
    params: Result<Query<LogQuery>, QueryRejection>,
) -> Result<Json<LogList>, ApiError> {
    let params = query(params)?;
    let filter = match params.kind.as_deref() {
        None | Some("") => LogFilter::All,
        Some(kind) => kind
            .parse::<LogFilter>()
            .map_err(|reason| ApiError::invalid("type", reason))?,
    };
    let guild_id = snowflake::parse_optional(params.guild_id.as_deref().unwrap_or(""))
        .map_err(|reason| ApiError::invalid("guild_id", reason))?;

    Ok(Json(LogList {
        logs: state.logs.list(filter, guild_id),
    }))
}
