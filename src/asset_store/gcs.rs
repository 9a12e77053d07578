use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::staging::StagedAsset;
use super::{object_name, AssetStore, StoredAsset, UploadError, UploadedAsset};
use crate::auth::GoogleAuth;

/// Google Cloud Storage asset backend. Objects get public URLs on
/// `storage.googleapis.com`.
pub struct GcsStore {
    auth: Arc<GoogleAuth>,
    bucket: String,
    client: Client,
    make_public: bool,
}

impl GcsStore {
    pub fn new(auth: Arc<GoogleAuth>, bucket: &str, make_public: bool) -> Result<Self, UploadError> {
        let client = Client::builder()
            .build()
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        Ok(Self {
            auth,
            bucket: bucket.to_string(),
            client,
            make_public,
        })
    }

    fn upload_url(&self) -> String {
        format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o",
            self.bucket
        )
    }

    /// JSON API object URL. The object name is one path segment, so `/` is encoded.
    fn object_url(&self, name: &str) -> Result<Url, UploadError> {
        let mut url = Url::parse("https://storage.googleapis.com/storage/v1/b")
            .map_err(|e| UploadError::Backend(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| UploadError::Backend("invalid GCS object URL".into()))?
            .push(&self.bucket)
            .push("o")
            .push(name);
        Ok(url)
    }

    pub fn public_url(&self, name: &str) -> String {
        format!("https://storage.googleapis.com/{}/{name}", self.bucket)
    }
}

#[async_trait]
impl AssetStore for GcsStore {
    async fn upload(
        &self,
        asset: &UploadedAsset,
        destination: Option<&str>,
    ) -> Result<StoredAsset, UploadError> {
        let token = self.auth.access_token().await?;
        let name = object_name(destination, &asset.filename);
        let staged = StagedAsset::stage(&asset.content).await?;

        let mut query = vec![("uploadType", "media"), ("name", name.as_str())];
        if self.make_public {
            query.push(("predefinedAcl", "publicRead"));
        }

        let resp = self
            .client
            .post(self.upload_url())
            .bearer_auth(&token)
            .query(&query)
            .header("Content-Type", asset.mime_type())
            .header("Content-Length", staged.size())
            .body(staged.body().await?)
            .send()
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Backend(format!(
                "GCS upload failed ({status}): {body}"
            )));
        }

        tracing::debug!(bucket = %self.bucket, object = %name, "Uploaded asset to GCS");

        Ok(StoredAsset {
            url: self.public_url(&name),
            id: name,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), UploadError> {
        let token = self.auth.access_token().await?;

        let resp = self
            .client
            .delete(self.object_url(id)?)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))?;

        // 404 is fine -- object already gone
        if !resp.status().is_success() && resp.status() != StatusCode::NOT_FOUND {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Backend(format!(
                "GCS delete failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}
