//! Health endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::HealthResponse;

/// GET /health - Liveness probe with the index size
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let chunks = state.index().len().await?;

    Ok(Json(HealthResponse {
        service: "profile-rag".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chunks,
    }))
}
