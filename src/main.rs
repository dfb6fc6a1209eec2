//! Nebula Backend Service
//!
//! Main entry point for the Nebula devlog platform backend. Serves the HTTP
//! API for the review queues, blackhole submissions, bets and quests.

use anyhow::Context;
use nebula_backend::config::AppConfig;
use nebula_backend::error::set_expose_internal_errors;
use nebula_backend::hackatime::HackatimeClient;
use nebula_backend::{api, build_store, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("nebula_backend={},tower_http=info", config.log_level).into()
    });

    if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, shutting down gracefully..."),
        Err(e) => warn!("Could not listen for Ctrl+C: {}", e),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    init_tracing(&config);
    set_expose_internal_errors(config.is_development());

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Nebula Backend Service Starting                ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP port: {}", config.http_port);

    // =========================================================================
    // RECORD STORE
    // =========================================================================
    info!("Record store backend: {:?}", config.store.backend);
    let store = build_store(&config.store).context("Failed to initialize record store")?;
    info!("✓ Record store client initialized ({})", config.store.api_url);

    // =========================================================================
    // CORE SERVICES INITIALIZATION
    // =========================================================================
    let hackatime = HackatimeClient::new(&config.hackatime)
        .context("Failed to initialize Hackatime client")?;
    if config.hackatime.api_key.is_none() {
        warn!("HACKATIME_API_KEY not set - stats requests are unauthenticated");
    }
    info!("✓ Hackatime client initialized ({})", config.hackatime.api_url);

    let http_port = config.http_port;
    let environment = config.environment.clone();
    let rewards = config.rewards.clone();

    let app_state = Arc::new(AppState::new(config, store, Arc::new(hackatime)));
    info!("✓ Application state initialized with repositories and services");
    info!(
        "Review threshold: {} votes ({} / {} coins per hour)",
        rewards.review_vote_threshold, rewards.review_top_rate, rewards.review_standard_rate
    );
    info!(
        "Blackhole cost: {} coins, minimum {} hours",
        rewards.blackhole_cost, rewards.blackhole_min_hours
    );

    // =========================================================================
    // START SERVER
    // =========================================================================
    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", addr))?;

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           Nebula Backend Service Ready!                  ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  HTTP API:     {}                              ║", addr);
    info!("║  Environment:  {}                                ║", environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, api::router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Nebula backend service shutdown complete");
    Ok(())
}
