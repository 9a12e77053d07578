use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;

use super::staging::StagedAsset;
use super::{AssetStore, StoredAsset, UploadError, UploadedAsset};
use crate::auth::GoogleAuth;

const GOOGLE_APIS_BASE: &str = "https://www.googleapis.com";

/// Google Drive asset backend using the resumable upload protocol.
pub struct DriveStore {
    auth: Arc<GoogleAuth>,
    client: Client,
    base_url: String,
    share_publicly: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    #[serde(default)]
    web_view_link: Option<String>,
}

impl DriveStore {
    pub fn new(auth: Arc<GoogleAuth>, share_publicly: bool) -> Result<Self, UploadError> {
        Self::with_base_url(auth, share_publicly, GOOGLE_APIS_BASE)
    }

    /// Point the store at another API host (an emulator or a test server).
    pub fn with_base_url(
        auth: Arc<GoogleAuth>,
        share_publicly: bool,
        base_url: &str,
    ) -> Result<Self, UploadError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        Ok(Self {
            auth,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            share_publicly,
        })
    }

    fn files_url(&self) -> String {
        format!("{}/drive/v3/files", self.base_url)
    }

    /// Open a resumable session and return its upload URI.
    async fn start_session(
        &self,
        token: &str,
        asset: &UploadedAsset,
        len: u64,
        folder: Option<&str>,
    ) -> Result<String, UploadError> {
        let mut metadata = serde_json::json!({ "name": asset.filename });
        if let Some(folder) = folder {
            metadata["parents"] = serde_json::json!([folder]);
        }

        let resp = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("uploadType", "resumable"),
                ("supportsAllDrives", "true"),
                ("fields", "id,webViewLink"),
            ])
            .header("X-Upload-Content-Type", asset.mime_type())
            .header("X-Upload-Content-Length", len)
            .json(&metadata)
            .send()
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Backend(format!(
                "Drive session start failed ({status}): {body}"
            )));
        }

        resp.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| UploadError::Backend("Drive session has no upload URI".into()))
    }

    async fn share_with_anyone(&self, token: &str, file_id: &str) -> Result<(), UploadError> {
        let resp = self
            .client
            .post(format!("{}/{file_id}/permissions", self.files_url()))
            .bearer_auth(token)
            .query(&[("supportsAllDrives", "true")])
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Backend(format!(
                "Drive permission update failed ({status}): {body}"
            )));
        }
        Ok(())
    }
}

/// Human-facing view link for a Drive file id.
pub fn view_link(file_id: &str) -> String {
    format!("https://drive.google.com/file/d/{file_id}/view")
}

#[async_trait]
impl AssetStore for DriveStore {
    async fn upload(
        &self,
        asset: &UploadedAsset,
        destination: Option<&str>,
    ) -> Result<StoredAsset, UploadError> {
        let token = self.auth.access_token().await?;
        let staged = StagedAsset::stage(&asset.content).await?;

        let session_uri = self
            .start_session(&token, asset, staged.size(), destination)
            .await?;

        let resp = self
            .client
            .put(&session_uri)
            .bearer_auth(&token)
            .header(header::CONTENT_LENGTH, staged.size())
            .body(staged.body().await?)
            .send()
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Backend(format!(
                "Drive upload failed ({status}): {body}"
            )));
        }

        let file: DriveFile = resp
            .json()
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        // Never leave an unshared file behind.
        if self.share_publicly {
            if let Err(e) = self.share_with_anyone(&token, &file.id).await {
                if let Err(cleanup) = self.delete(&file.id).await {
                    tracing::warn!(
                        file_id = %file.id,
                        error = %cleanup,
                        "Failed to remove unshared upload"
                    );
                }
                return Err(e);
            }
        }

        tracing::debug!(file_id = %file.id, name = %asset.filename, "Uploaded asset to Drive");

        Ok(StoredAsset {
            url: file.web_view_link.unwrap_or_else(|| view_link(&file.id)),
            id: file.id,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), UploadError> {
        let token = self.auth.access_token().await?;

        let resp = self
            .client
            .delete(format!("{}/{id}", self.files_url()))
            .bearer_auth(&token)
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Backend(format!(
                "Drive delete failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::extract::State;
    use axum::http::StatusCode as HttpStatus;
    use axum::response::IntoResponse;
    use axum::routing::{delete, post, put};
    use axum::{Json, Router};

    use super::*;
    use crate::auth::{TokenSource, SCOPE_DRIVE};
    use crate::catalog::LinkDeriver;

    /// Minimal Drive API stand-in whose permission endpoint always refuses.
    async fn refusing_drive() -> (String, Arc<AtomicBool>) {
        let deleted = Arc::new(AtomicBool::new(false));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let session = format!("{base}/session");
        let app = Router::new()
            .route(
                "/upload/drive/v3/files",
                post(move || {
                    let session = session.clone();
                    async move { (HttpStatus::OK, [(header::LOCATION, session)]).into_response() }
                }),
            )
            .route(
                "/session",
                put(|| async { Json(serde_json::json!({ "id": "F1" })) }),
            )
            .route(
                "/drive/v3/files/F1/permissions",
                post(|| async { (HttpStatus::FORBIDDEN, "sharing disabled") }),
            )
            .route(
                "/drive/v3/files/F1",
                delete(|State(deleted): State<Arc<AtomicBool>>| async move {
                    deleted.store(true, Ordering::SeqCst);
                    HttpStatus::NO_CONTENT
                }),
            )
            .with_state(Arc::clone(&deleted));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (base, deleted)
    }

    fn store(base: &str, share_publicly: bool) -> DriveStore {
        let auth = GoogleAuth::lazy(TokenSource::Static("t".into()), &[SCOPE_DRIVE]).unwrap();
        DriveStore::with_base_url(Arc::new(auth), share_publicly, base).unwrap()
    }

    #[tokio::test]
    async fn test_share_failure_deletes_uploaded_file() {
        let (base, deleted) = refusing_drive().await;
        let asset = UploadedAsset::new("talk.pdf", &b"%PDF"[..]);

        let err = store(&base, true).upload(&asset, Some("folder")).await.unwrap_err();
        assert!(matches!(err, UploadError::Backend(_)));
        assert!(deleted.load(Ordering::SeqCst), "unshared file should be removed");
    }

    #[tokio::test]
    async fn test_upload_without_sharing_keeps_file() {
        let (base, deleted) = refusing_drive().await;
        let asset = UploadedAsset::new("talk.pdf", &b"%PDF"[..]);

        let stored = store(&base, false).upload(&asset, None).await.unwrap();
        assert_eq!(stored.id, "F1");
        assert_eq!(stored.url, view_link("F1"));
        assert!(!deleted.load(Ordering::SeqCst));
    }

    #[test]
    fn test_view_link_round_trips_through_deriver() {
        let link = view_link("1AbCdE");
        assert_eq!(
            LinkDeriver::default().derive(&link),
            "https://drive.google.com/uc?export=download&id=1AbCdE"
        );
    }
}
