use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Component, Path, PathBuf};

use super::{object_name, AssetStore, StoredAsset, UploadError, UploadedAsset};

/// Local filesystem asset store for development and testing. Files are
/// served back by the `/assets` route.
pub struct LocalStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P, public_base_url: &str) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a key under the base directory, refusing anything that climbs out of it.
    fn object_path(&self, key: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(UploadError::NotFound(key.to_string()));
        }
        Ok(self.base_path.join(relative))
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("{}/assets/{key}", self.public_base_url)
    }

    pub async fn get(&self, key: &str) -> Result<Bytes, UploadError> {
        let path = self.object_path(key)?;
        if !path.is_file() {
            return Err(UploadError::NotFound(key.to_string()));
        }
        let data = tokio::fs::read(&path).await?;
        Ok(Bytes::from(data))
    }

    pub async fn exists(&self, key: &str) -> Result<bool, UploadError> {
        Ok(self.object_path(key)?.is_file())
    }
}

#[async_trait]
impl AssetStore for LocalStore {
    async fn upload(
        &self,
        asset: &UploadedAsset,
        destination: Option<&str>,
    ) -> Result<StoredAsset, UploadError> {
        let key = object_name(destination, &asset.filename);
        let path = self.object_path(&key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &asset.content).await?;

        Ok(StoredAsset {
            url: self.url_for(&key),
            id: key,
        })
    }

    async fn delete(&self, id: &str) -> Result<(), UploadError> {
        let path = self.object_path(id)?;
        if path.exists() {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }
}
