// Entry point: the guild protection bot and its dashboard API.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (SQLite stores)
// - `discord/` = Discord-specific adapters (commands, events, gateway)
// - `web/` = The dashboard's HTTP API
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Start the dashboard API, the lockdown sweeper and (if configured) the bot,
//    whose events drive automatic raid detection

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;
mod settings;
#[path = "web/web_layer.rs"]
mod web;

use crate::core::clock::{Clock, SystemClock};
use crate::core::guild_config::GuildConfigService;
use crate::core::guild_locks::GuildLocks;
use crate::core::logging::{LogKind, LogRegistry};
use crate::core::moderation::{ModerationService, ModerationState};
use crate::core::platform::PlatformGateway;
use crate::core::protection::ProtectionService;
use crate::core::server_stats::ServerStatsService;
use crate::discord::platform::SerenityGateway;
use crate::discord::{Data, Error};
use crate::infra::guild_config::SqliteGuildConfigStore;
use crate::infra::moderation::{SqliteBackupStore, SqliteModerationStore};
use crate::infra::{ModerationControl, ProtectionControl};
use crate::settings::Settings;
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // This is the "composition root" where we wire everything together.

    let pool = infra::sqlite::connect(&settings.database_path()).await?;
    let config_store = SqliteGuildConfigStore::new(pool.clone());
    config_store
        .migrate()
        .await
        .context("Failed to migrate guild config table")?;
    let backup_store = SqliteBackupStore::new(pool.clone());
    backup_store
        .migrate()
        .await
        .context("Failed to migrate backup table")?;
    let state_store = SqliteModerationStore::new(pool);
    state_store
        .migrate()
        .await
        .context("Failed to migrate moderation state table")?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let logs = Arc::new(LogRegistry::new(settings.log_retention, Arc::clone(&clock)));
    let gateway = Arc::new(SerenityGateway::new(
        settings.verification_role_id,
        settings.pending_role_id,
    ));
    let platform: Arc<dyn PlatformGateway> = gateway.clone();

    let moderation_state = Arc::new(ModerationState::new());
    let config = Arc::new(GuildConfigService::new(
        config_store,
        Arc::new(GuildLocks::new()),
    ));
    let moderation = Arc::new(ModerationService::new(
        Arc::clone(&config),
        backup_store,
        state_store,
        Arc::clone(&moderation_state),
        Arc::clone(&platform),
        Arc::clone(&logs),
        Arc::clone(&clock),
    ));
    let restored = moderation
        .load_state()
        .await
        .context("Failed to load moderation state")?;
    tracing::info!(guilds = restored, "Moderation state loaded");

    let protection = Arc::new(ProtectionService::new(
        Arc::clone(&config),
        Arc::clone(&moderation),
        Arc::clone(&logs),
        Arc::clone(&clock),
    ));
    let stats = Arc::new(ServerStatsService::new(
        Arc::clone(&platform),
        moderation_state,
        Arc::clone(&clock),
    ));

    logs.record(LogKind::Info, None, "Dashboard started");

    // ========================================================================
    // BACKGROUND TASKS
    // ========================================================================

    tokio::spawn(sweep_lockdowns(
        Arc::clone(&moderation),
        Arc::clone(&protection),
        settings.lockdown_sweep,
    ));

    let state = web::AppState {
        config: Arc::clone(&config),
        moderation: Arc::clone(&moderation),
        stats,
        gateway: platform,
        logs: Arc::clone(&logs),
        token: settings.dashboard_token.as_deref().map(Arc::from),
    };
    if state.token.is_none() {
        tracing::warn!("DASHBOARD_TOKEN is not set; the dashboard API is unauthenticated");
    }
    let listener = tokio::net::TcpListener::bind(settings.bind)
        .await
        .with_context(|| format!("Failed to bind dashboard to {}", settings.bind))?;
    let server = web::serve(listener, state);

    let data = Data {
        config,
        moderation,
        protection,
        gateway,
        logs,
    };

    tokio::select! {
        result = server => result?,
        result = run_bot(settings.discord_token.clone(), data) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
    }

    Ok(())
}

/// Unlock guilds whose lockdown has run out, every `period`. Stale detection
/// counters are dropped on the same beat.
async fn sweep_lockdowns(
    moderation: Arc<ModerationControl>,
    protection: Arc<ProtectionControl>,
    period: std::time::Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let unlocked = moderation.sweep_expired().await;
        if !unlocked.is_empty() {
            tracing::info!(?unlocked, "Expired lockdowns cleared");
        }
        protection.prune();
    }
}

/// Run the Discord client. Without a token the dashboard keeps running with
/// the platform reported Offline.
async fn run_bot(token: Option<String>, data: Data) -> anyhow::Result<()> {
    let Some(token) = token else {
        tracing::warn!("DISCORD_TOKEN is not set; running the dashboard without the bot");
        std::future::pending::<()>().await;
        return Ok(());
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::<Data, Error>::builder()
        .options(poise::FrameworkOptions {
            commands: discord::moderation::commands::all(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(discord::events::event_handler(ctx, event, framework, data))
            },
            on_error: |error| {
                Box::pin(async move {
                    tracing::error!("Command error: {}", error);
                    if let Err(e) = poise::builtins::on_error(error).await {
                        tracing::error!("Error while handling error: {}", e);
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Slash commands registered");
                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Failed to create Discord client")?;

    client.start().await.context("Discord client stopped")?;
    Ok(())
}
