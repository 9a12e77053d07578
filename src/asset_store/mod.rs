mod drive;
mod gcs;
mod local;
pub mod staging;

pub use drive::DriveStore;
pub use gcs::GcsStore;
pub use local::LocalStore;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A file received from a submission, held only for the duration of the upload.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    pub filename: String,
    pub content: Bytes,
    pub content_type: Option<String>,
}

impl UploadedAsset {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            content_type: None,
        }
    }

    /// MIME type from the multipart Content-Type, else guessed from the filename.
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_path(&self.filename)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// Where an asset ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    /// Backend identifier, accepted by [`AssetStore::delete`].
    pub id: String,
    /// Public or shareable link to the file.
    pub url: String,
}

/// Blob store that hosts uploaded slides.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload into `destination` (a folder id or prefix) and return a shareable URL.
    async fn upload(
        &self,
        asset: &UploadedAsset,
        destination: Option<&str>,
    ) -> Result<StoredAsset, UploadError>;

    /// Remove a previously uploaded asset. Missing assets are not an error.
    async fn delete(&self, id: &str) -> Result<(), UploadError>;
}

/// Reduce a client-supplied filename to a safe single path segment.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.').to_string();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Unique object name: `<destination>/<uuid>-<filename>`.
pub fn object_name(destination: Option<&str>, filename: &str) -> String {
    let file = format!("{}-{}", uuid::Uuid::new_v4(), sanitize_filename(filename));
    let prefix: Vec<String> = destination
        .unwrap_or_default()
        .split('/')
        .filter(|s| !s.trim().is_empty())
        .map(sanitize_filename)
        .collect();

    if prefix.is_empty() {
        file
    } else {
        format!("{}/{file}", prefix.join("/"))
    }
}
