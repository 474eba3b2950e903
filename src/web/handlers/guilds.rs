use crate::core::platform::GuildSummary;
use crate::web::AppState;
use axum::extract::{Json, State};

/// Guilds for the scope picker. Empty while the bot is offline.
pub async fn list_guilds(State(state): State<AppState>) -> Json<Vec<GuildSummary>> {
    match state.gateway.guilds().await {
        Ok(guilds) => Json(guilds),
        Err(e) => {
            tracing::warn!(error = %e, "Could not list guilds");
            Json(Vec::new())
        }
    }
}
