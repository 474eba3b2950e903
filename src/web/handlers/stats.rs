use super::{query, ScopeQuery};
use crate::core::server_stats::GuildStats;
use crate::web::error::ApiError;
use crate::web::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Query, State};

pub async fn get_stats(
    State(state): State<AppState>,
    params: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<GuildStats>, ApiError> {
    let scope = query(params)?.scope()?;
    Ok(Json(state.stats.compute(scope).await))
}
