use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

use super::library_error;
use crate::api::response::{ApiError, JSend};
use crate::library::CatalogStatus;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn catalog_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<CatalogStatus>>, ApiError> {
    let status = state.library.status().await.map_err(library_error)?;
    Ok(JSend::success(status))
}
