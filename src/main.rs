//! WanderPlan Backend Service
//!
//! Main entry point for the WanderPlan API server.
//! This service provides:
//! - REST API for trips, collaboration, itinerary, expenses and the CRM
//! - Event forwarding to the realtime relay (see `wanderplan-relay`)

use anyhow::Context;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use wanderplan::api::create_router;
use wanderplan::config::init_tracing;
use wanderplan::database::{create_pool, run_migrations};
use wanderplan::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables first
    dotenv::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Configuration error")?;

    init_tracing("wanderplan", &config.log_level, &config.log_format);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           WanderPlan Backend Starting                     ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Environment: {}", config.environment);
    info!("Log level: {}", config.log_level);
    info!("HTTP address: {}", config.bind_address());
    match &config.relay.url {
        Some(url) => info!("Realtime relay: {}", url),
        None => warn!("RELAY_URL not configured - realtime events will not be forwarded"),
    }

    // =========================================================================
    // DATABASE SETUP
    // =========================================================================
    info!("Connecting to database...");

    let pool = create_pool(&config.database).await.map_err(|e| {
        error!("Failed to create database pool: {}", e);
        e
    })?;

    info!("Database connection pool created successfully");
    info!("Max connections: {}", config.database.max_connections);

    info!("Running database migrations...");
    run_migrations(&pool, Some(config.database.migrations_path.as_str()))
        .await
        .map_err(|e| {
            error!("Database migration failed: {}", e);
            e
        })?;
    info!("Database migrations completed successfully");

    // =========================================================================
    // SERVICES AND ROUTES
    // =========================================================================
    let bind_address = config.bind_address();
    let environment = config.environment.clone();
    let state = Arc::new(AppState::new(pool, config));
    info!("✓ Application state initialized");

    let app = create_router(state);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind HTTP server on {}", bind_address))?;

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    });

    // =========================================================================
    // READY
    // =========================================================================
    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           WanderPlan Backend Ready!                       ║");
    info!("╠══════════════════════════════════════════════════════════╣");
    info!("║  HTTP API:     {}                              ║", bind_address);
    info!("║  Environment:  {}                                    ║", environment);
    info!("╚══════════════════════════════════════════════════════════╝");
    info!("Press Ctrl+C to shutdown gracefully");

    // =========================================================================
    // SHUTDOWN HANDLING
    // =========================================================================
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = server_handle => {
            error!("HTTP server exited unexpectedly");
        }
    }

    info!("WanderPlan backend shutdown complete");
    Ok(())
}
