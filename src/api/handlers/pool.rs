//! Proxy pool management handlers

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

use crate::api::server::AppState;
use crate::error::HopperError;
use crate::models::ReplacePoolReport;
use crate::proxy::parse_proxy_list;

/// Replace the proxy pool from a newline-delimited text body
///
/// A body with no valid entries leaves the existing pool untouched and is
/// reported back with `replaced: false`.
pub async fn replace_pool(
    State(state): State<AppState>,
    body: String,
) -> Result<impl IntoResponse, HopperError> {
    let parsed = parse_proxy_list(&body);
    let loaded = parsed.proxies.len();

    if loaded == 0 {
        warn!(
            skipped = parsed.skipped,
            "Ignoring pool replacement with no valid entries"
        );
        return Ok(Json(ReplacePoolReport {
            loaded: 0,
            skipped: parsed.skipped,
            replaced: false,
        }));
    }

    state.rotator.replace_pool(parsed.proxies);
    info!(loaded, skipped = parsed.skipped, "Proxy pool replaced");

    Ok(Json(ReplacePoolReport {
        loaded,
        skipped: parsed.skipped,
        replaced: true,
    }))
}

/// Rotation statistics for the current pool and usage period
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.rotator.stats())
}
