//! Shared test helpers: local-backend libraries and stores that always fail.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::asset_store::{AssetStore, LocalStore, StoredAsset, UploadError, UploadedAsset};
use crate::catalog::{AppendAck, Cell, CatalogError, CatalogStore, LocalCatalog};
use crate::config::{AssetConfig, CatalogConfig, Config, SubmissionPolicy};
use crate::library::Library;
use crate::AppState;

/// Catalog settings used by tests: local backend, drive links on `drive.example`.
pub fn test_catalog_config(temp_dir: &tempfile::TempDir) -> CatalogConfig {
    CatalogConfig {
        data_dir: temp_dir.path().join("data").to_string_lossy().to_string(),
        drive_host: "drive.example".to_string(),
        ..Default::default()
    }
}

/// A local catalog with the header row already written.
pub fn test_catalog(temp_dir: &tempfile::TempDir) -> LocalCatalog {
    let settings = test_catalog_config(temp_dir);
    let catalog = LocalCatalog::open(&settings.data_dir).expect("Failed to open test catalog");
    catalog
        .ensure_header(
            &settings.sheet_id,
            &settings.append_range,
            &settings.row_layout.headers(),
        )
        .expect("Failed to write test header");
    catalog
}

pub fn test_library_with(
    temp_dir: &tempfile::TempDir,
    assets: Arc<dyn AssetStore>,
    policy: SubmissionPolicy,
) -> (Library, LocalCatalog) {
    let catalog = test_catalog(temp_dir);
    let library = Library::new(
        Arc::new(catalog.clone()),
        assets,
        test_catalog_config(temp_dir),
        None,
        policy,
    );
    (library, catalog)
}

/// A library over a local catalog and a local asset store.
pub fn test_library(temp_dir: &tempfile::TempDir) -> (Library, LocalCatalog) {
    let assets = LocalStore::new(temp_dir.path().join("files"), "http://localhost:8080")
        .expect("Failed to create test asset store");
    test_library_with(temp_dir, Arc::new(assets), SubmissionPolicy::default())
}

/// Create a test AppState backed by local stores in a temporary directory.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        catalog: test_catalog_config(temp_dir),
        assets: AssetConfig {
            local_storage_path: temp_dir.path().join("files").to_string_lossy().to_string(),
            ..Default::default()
        },
        policy: SubmissionPolicy::default(),
        credentials_file: None,
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    };

    let local_assets = Arc::new(
        LocalStore::new(&config.assets.local_storage_path, &config.assets.public_base_url)
            .expect("Failed to create test asset store"),
    );
    let catalog = test_catalog(temp_dir);
    let library = Library::new(
        Arc::new(catalog),
        local_assets.clone(),
        config.catalog.clone(),
        None,
        config.policy.clone(),
    );

    Arc::new(AppState {
        config,
        library,
        local_assets: Some(local_assets),
    })
}

pub fn fixture_asset() -> UploadedAsset {
    UploadedAsset {
        filename: "talk.pdf".to_string(),
        content: Bytes::from_static(b"%PDF-1.4 slides"),
        content_type: Some("application/pdf".to_string()),
    }
}

/// Asset store whose uploads always fail.
pub struct FailingAssets;

#[async_trait]
impl AssetStore for FailingAssets {
    async fn upload(
        &self,
        _asset: &UploadedAsset,
        _destination: Option<&str>,
    ) -> Result<StoredAsset, UploadError> {
        Err(UploadError::Backend("permission denied".to_string()))
    }

    async fn delete(&self, _id: &str) -> Result<(), UploadError> {
        Ok(())
    }
}

/// Catalog whose reads and appends always fail.
pub struct FailingCatalog;

#[async_trait]
impl CatalogStore for FailingCatalog {
    async fn read_all(&self, _sheet_id: &str, _range: &str) -> Result<Vec<Vec<Cell>>, CatalogError> {
        Err(CatalogError::Remote("service unavailable".to_string()))
    }

    async fn append_row(
        &self,
        _sheet_id: &str,
        _range: &str,
        _row: &[String],
    ) -> Result<AppendAck, CatalogError> {
        Err(CatalogError::Remote("service unavailable".to_string()))
    }
}
