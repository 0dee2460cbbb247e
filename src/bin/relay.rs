//! WanderPlan Realtime Relay
//!
//! Standalone process fanning trip events out to WebSocket clients.
//! - WebSocket listener on `RELAY_WS_PORT` (path `/api/socketio`)
//! - Internal HTTP on `RELAY_HTTP_PORT` for `POST /emit` and `GET /health`

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use wanderplan::config::{init_tracing, RelayConfig};
use wanderplan::realtime::{relay_http, RelayServer, RELAY_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = RelayConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Configuration error")?;

    init_tracing("wanderplan", &config.log_level, &config.log_format);

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║           WanderPlan Relay Starting                       ║");
    info!("╚══════════════════════════════════════════════════════════╝");
    if config.secret.is_none() {
        warn!("RELAY_SECRET not configured - /emit accepts unauthenticated requests");
    }

    let server = RelayServer::new();

    // =========================================================================
    // WEBSOCKET LISTENER
    // =========================================================================
    let ws_addr = format!("0.0.0.0:{}", config.ws_port);
    let ws_listener = TcpListener::bind(&ws_addr)
        .await
        .with_context(|| format!("Failed to bind WebSocket listener on {}", ws_addr))?;
    let ws_handle = tokio::spawn(server.clone().serve(ws_listener));
    info!("✓ WebSocket listener started on {}{}", ws_addr, RELAY_PATH);

    // =========================================================================
    // INTERNAL HTTP
    // =========================================================================
    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let http_listener = TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("Failed to bind relay HTTP listener on {}", http_addr))?;
    let app = relay_http::router(server, config.secret.clone());
    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(http_listener, app).await {
            error!("Relay HTTP server error: {}", e);
        }
    });
    info!("✓ Relay HTTP started on {}", http_addr);
    info!("Press Ctrl+C to shutdown gracefully");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down gracefully...");
        }
        _ = ws_handle => {
            error!("WebSocket listener exited unexpectedly");
        }
        _ = http_handle => {
            error!("Relay HTTP server exited unexpectedly");
        }
    }

    info!("WanderPlan relay shutdown complete");
    Ok(())
}
