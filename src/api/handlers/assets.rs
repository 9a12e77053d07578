use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::api::response::ApiError;
use crate::asset_store::UploadError;
use crate::AppState;

/// Serve a locally stored asset.
/// Route: GET /assets/*key
pub async fn serve_asset(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let store = state
        .local_assets
        .as_ref()
        .ok_or_else(|| ApiError::not_found("Asset not found"))?;

    let data = store.get(&key).await.map_err(|e| match e {
        UploadError::NotFound(_) => ApiError::not_found("Asset not found"),
        _ => ApiError::internal(format!("Failed to read asset: {e}")),
    })?;

    let mime_type = mime_guess::from_path(&key)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    // Stored names are "<uuid>-<original>"; offer the original name
    let filename = key.rsplit('/').next().unwrap_or(&key);
    let filename = filename
        .get(37..)
        .filter(|_| filename.as_bytes().get(36) == Some(&b'-'))
        .unwrap_or(filename);
    if let Ok(value) = format!("inline; filename=\"{filename}\"").parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    // Uploads are never overwritten
    headers.insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("public, max-age=3600"),
    );

    Ok(response)
}
