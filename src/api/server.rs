//! API server using Axum
//!
//! Exposes the forward endpoint, pool replacement, and stats queries.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::ServerConfig;
use crate::error::{HopperError, Result};
use crate::proxy::{Forwarder, Rotator};

use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub rotator: Arc<Rotator>,
    pub forwarder: Arc<Forwarder>,
    pub started_at: Instant,
}

/// API server
pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ServerConfig, rotator: Arc<Rotator>, forwarder: Arc<Forwarder>) -> Self {
        let state = AppState {
            rotator,
            forwarder,
            started_at: Instant::now(),
        };

        Self { config, state }
    }

    /// Build the router
    fn build_router(&self) -> Router {
        routes::create_router(self.state.clone()).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                HopperError::InvalidConfig(format!(
                    "invalid server address {}:{}",
                    self.config.host, self.config.port
                ))
            })?;

        let router = self.build_router();

        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| HopperError::Internal(e.to_string()))?;

        info!("API server shut down");
        Ok(())
    }
}
