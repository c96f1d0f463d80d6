//! # NexCart Shop API
//!
//! HTTP server for the storefront.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Shop API Server                                 │
//! │                                                                         │
//! │  Storefront ───► HTTP (8000) ───► Services ───► SQLite                 │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                                    Stripe                               │
//! │                               (payment intents)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use nexcart_db::{Database, DbConfig};
use shop_api::{build_router, AppState, ShopConfig, StripeClient, StripeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so log_level can seed the filter
    let config = ShopConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting NexCart Shop API server...");
    info!(
        port = config.http_port,
        database = %config.database_path,
        currency = %config.currency,
        "Configuration loaded"
    );

    // Connect to database (migrations run on connect)
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.database_max_connections),
    )
    .await
    .context("Failed to open database")?;

    let processor = Arc::new(
        StripeClient::new(StripeConfig {
            api_base: config.stripe_api_base.clone(),
            secret_key: config.stripe_secret_key.clone(),
            timeout: config.stripe_timeout(),
        })
        .context("Failed to build Stripe client")?,
    );

    // Create shared state
    let state = Arc::new(AppState::new(db.clone(), config.clone(), processor));
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// If a handler cannot be installed the error is logged and that signal is
/// ignored; the other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
