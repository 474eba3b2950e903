// Web layer - the dashboard's HTTP+JSON API.
//
// Handlers only translate between HTTP and the core services; every rule
// about configs, raids and lockdowns lives in `core`.

#[path = "error.rs"]
pub mod error;

#[path = "handlers/mod.rs"]
pub mod handlers;

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

use crate::core::logging::LogRegistry;
use crate::core::platform::PlatformGateway;
use crate::core::server_stats::ServerStatsService;
use crate::infra::{ConfigService, ModerationControl};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use error::ApiError;
use handlers::{config, guilds, health, logs, members, moderation, stats};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Everything the handlers need, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigService>,
    pub moderation: Arc<ModerationControl>,
    pub stats: Arc<ServerStatsService>,
    pub gateway: Arc<dyn PlatformGateway>,
    pub logs: Arc<LogRegistry>,
    /// Bearer token required on `/api/*`. `None` leaves the API open.
    pub token: Option<Arc<str>>,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/config", get(config::get_config).post(config::update_config))
        .route("/api/stats", get(stats::get_stats))
        .route("/api/guilds", get(guilds::list_guilds))
        .route("/api/members", get(members::list_members))
        .route("/api/logs", get(logs::list_logs))
        .route("/api/raidmode", post(moderation::raid_mode))
        .route("/api/lockdown", post(moderation::lockdown))
        .route("/api/lockdown/cancel", post(moderation::cancel_lockdown))
        .route("/api/backup", post(moderation::backup))
        .route("/api/restore", post(moderation::restore))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject API calls that don't carry `Authorization: Bearer <token>` when a
/// dashboard token is configured.
async fn require_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.token.as_deref() {
        let presented = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if !presented.is_some_and(|token| token_matches(token, expected)) {
            return Err(ApiError::Unauthorized);
        }
    }
    Ok(next.run(request).await)
}

/// Compare two tokens in time that depends on neither. Hashing first makes
/// both sides the same length.
fn token_matches(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented
        .iter()
        .zip(expected.iter())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

/// Serve the API until the task is dropped or the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    let address = listener.local_addr()?;
    tracing::info!(%address, "Dashboard API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
