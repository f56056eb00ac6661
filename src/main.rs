//! Hopper Forwarder - Entry Point
//!
//! Starts the API server with graceful shutdown support.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod models;
mod proxy;

use api::ApiServer;
use config::{Config, LogConfig};
use proxy::{load_proxy_file, Forwarder, HttpTransport, Rotator};

#[tokio::main]
async fn main() -> error::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log);

    info!("Starting Hopper Forwarder");

    // Create the shared rotator and load the initial pool
    let rotator = Arc::new(Rotator::new());
    if let Some(path) = &config.pool.proxy_file {
        let parsed = load_proxy_file(path)?;
        if parsed.skipped > 0 {
            warn!(
                skipped = parsed.skipped,
                file = %path.display(),
                "Skipped malformed proxy lines"
            );
        }
        info!(
            loaded = parsed.proxies.len(),
            file = %path.display(),
            "Loaded proxy list"
        );
        rotator.replace_pool(parsed.proxies);
    } else {
        info!("No PROXY_FILE configured, starting with an empty pool");
    }

    // Create the forwarder over the production transport
    let transport = Arc::new(HttpTransport::new(
        config.forward.connect_timeout_duration(),
        config.forward.request_timeout_duration(),
    ));
    let forwarder = Arc::new(Forwarder::new(rotator.clone(), transport));

    // Create the API server
    let server = ApiServer::new(config.server.clone(), rotator, forwarder);

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(shutdown_rx).await {
            error!("API server error: {}", e);
        }
    });

    info!("Server started on {}", config.server_addr());

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = server_task.await;

    info!("Hopper Forwarder stopped");
    Ok(())
}

/// Initialize the tracing subscriber from the log configuration
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("hopper={},tower_http=debug", log.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if log.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
