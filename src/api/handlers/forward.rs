//! Request forwarding handler

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::server::AppState;
use crate::error::HopperError;
use crate::models::ForwardRequest;

/// Forward a client request through the proxy pool
pub async fn forward(
    State(state): State<AppState>,
    Json(request): Json<ForwardRequest>,
) -> Result<impl IntoResponse, HopperError> {
    let reply = state.forwarder.forward(request).await?;
    Ok(Json(reply))
}
