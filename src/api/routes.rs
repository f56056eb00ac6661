//! API route definitions

use axum::routing::{get, post, put};
use axum::Router;

use super::handlers;
use super::server::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        // Forwarding and pool management
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/forward", post(handlers::forward::forward))
        .route("/proxies", put(handlers::pool::replace_pool))
        .route("/stats", get(handlers::pool::stats))
}
