use anyhow::Result;
use common::telemetry::{init_telemetry, shutdown_telemetry, TelemetryConfig};
use common::AppConfig;
use std::net::SocketAddr;

mod error;
mod handlers;
mod routes;
mod state;

use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;

    init_telemetry(TelemetryConfig::new("order-api", &config)).map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!("Starting Order API...");

    tracing::info!("Configuration:");
    tracing::info!("  Redis URL: {}", config.cache.redis_url);
    tracing::info!("  Cache TTL: {} seconds", config.cache.ttl_seconds);
    tracing::info!("  Request timeout: {} seconds", config.server.request_timeout_secs);
    tracing::info!("  Port: {}", config.server.port);

    let state = AppState::connect(&config).await?;

    let app = routes::create_router(state, config.server.request_timeout());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Order API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            tracing::error!("Server error: {}", e);
            e
        })?;

    // Shutdown telemetry gracefully
    shutdown_telemetry();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutting down Order API...");
}
