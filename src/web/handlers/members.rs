use super::{query, ScopeQuery};
use crate::core::guild_locks::ConfigScope;
use crate::core::platform::MemberSummary;
use crate::web::error::ApiError;
use crate::web::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Json, Query, State};

const MEMBER_PAGE: usize = 100;

/// First members of the selected guild, or of the first guild when none is
/// selected. Platform trouble yields an empty list.
pub async fn list_members(
    State(state): State<AppState>,
    params: Result<Query<ScopeQuery>, QueryRejection>,
) -> Result<Json<Vec<MemberSummary>>, ApiError> {
    let guild_id = match query(params)?.scope()? {
        ConfigScope::Guild(id) => Some(id),
        ConfigScope::Global => match state.gateway.guilds().await {
            Ok(guilds) => guilds.first().map(|g| g.id),
            Err(e) => {
                tracing::warn!(error = %e, "Could not list guilds");
                None
            }
        },
    };
    let Some(guild_id) = guild_id else {
        return Ok(Json(Vec::new()));
    };

    match state.gateway.members(guild_id, MEMBER_PAGE).await {
        Ok(members) => Ok(Json(members)),
        Err(e) => {
            tracing::warn!(guild_id, error = %e, "Could not list members");
            Ok(Json(Vec::new()))
        }
    }
}
