use thiserror::Error;

use crate::catalog::link::DEFAULT_DRIVE_HOST;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    pub catalog: CatalogConfig,
    pub assets: AssetConfig,
    pub policy: SubmissionPolicy,
    /// Path to a service account JSON key. Falls back to the metadata server.
    pub credentials_file: Option<String>,
    /// Maximum upload size in bytes
    pub max_upload_size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogBackend {
    Local,
    Sheets,
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub backend: CatalogBackend,
    pub sheet_id: String,
    /// A1 range read on every browse, header row first.
    pub read_range: String,
    /// A1 anchor rows are appended after.
    pub append_range: String,
    pub row_layout: RowLayout,
    /// Directory for the local catalog database
    pub data_dir: String,
    /// Host marker for drive view links.
    pub drive_host: String,
}

/// Column order of appended rows. Must match the target sheet's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLayout {
    /// Title, Description, Keywords, Link
    Basic,
    /// Title, Description, Keywords, Link, Person
    WithPerson,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetBackend {
    Drive,
    Gcs,
    Local,
}

#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub backend: AssetBackend,
    /// Drive folder id, or object prefix for GCS and local storage.
    pub destination: Option<String>,
    /// GCS bucket name (required when backend is gcs)
    pub gcs_bucket: Option<String>,
    /// Directory for local storage backend
    pub local_storage_path: String,
    /// Base URL local assets are linked under.
    pub public_base_url: String,
    /// Grant "anyone with the link" read access after upload.
    pub share_publicly: bool,
}

/// What happens when one half of a submission fails.
#[derive(Debug, Clone)]
pub struct SubmissionPolicy {
    /// Append the row with the placeholder link when the upload fails.
    pub append_on_upload_failure: bool,
    /// Delete the uploaded asset when the catalog append fails.
    pub cleanup_on_append_failure: bool,
    /// Link recorded when there is no file.
    pub placeholder_link: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackend::Local,
            sheet_id: "local".to_string(),
            read_range: "Sheet1!A:Z".to_string(),
            append_range: "Sheet1!A1".to_string(),
            row_layout: RowLayout::WithPerson,
            data_dir: "./data".to_string(),
            drive_host: DEFAULT_DRIVE_HOST.to_string(),
        }
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            backend: AssetBackend::Local,
            destination: None,
            gcs_bucket: None,
            local_storage_path: "./files".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            share_publicly: true,
        }
    }
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            append_on_upload_failure: false,
            cleanup_on_append_failure: true,
            placeholder_link: "No file uploaded".to_string(),
        }
    }
}

impl RowLayout {
    pub fn headers(self) -> Vec<String> {
        let mut headers = vec!["Title", "Description", "Keywords", "Link"];
        if self == RowLayout::WithPerson {
            headers.push("Person");
        }
        headers.into_iter().map(str::to_string).collect()
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let catalog_defaults = CatalogConfig::default();
        let asset_defaults = AssetConfig::default();
        let policy_defaults = SubmissionPolicy::default();

        let bind_address = env_or("BIND_ADDRESS", "0.0.0.0:8080");

        let catalog_backend = match env_or("CATALOG_BACKEND", "local").to_lowercase().as_str() {
            "sheets" => CatalogBackend::Sheets,
            _ => CatalogBackend::Local,
        };

        let row_layout = match env_or("ROW_LAYOUT", "with_person").to_lowercase().as_str() {
            "basic" => RowLayout::Basic,
            _ => RowLayout::WithPerson,
        };

        let asset_backend = match env_or("ASSET_BACKEND", "local").to_lowercase().as_str() {
            "drive" => AssetBackend::Drive,
            "gcs" => AssetBackend::Gcs,
            _ => AssetBackend::Local,
        };

        let max_upload_size = std::env::var("MAX_UPLOAD_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(50 * 1024 * 1024); // 50MB

        let config = Config {
            bind_address: bind_address.clone(),
            catalog: CatalogConfig {
                backend: catalog_backend,
                sheet_id: env_or("SHEET_ID", &catalog_defaults.sheet_id),
                read_range: env_or("CATALOG_READ_RANGE", &catalog_defaults.read_range),
                append_range: env_or("CATALOG_APPEND_RANGE", &catalog_defaults.append_range),
                row_layout,
                data_dir: env_or("DATA_DIR", &catalog_defaults.data_dir),
                drive_host: env_or("DRIVE_HOST", &catalog_defaults.drive_host),
            },
            assets: AssetConfig {
                backend: asset_backend,
                destination: std::env::var("DESTINATION_FOLDER")
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                gcs_bucket: std::env::var("GCS_BUCKET").ok(),
                local_storage_path: env_or(
                    "LOCAL_STORAGE_PATH",
                    &asset_defaults.local_storage_path,
                ),
                public_base_url: std::env::var("PUBLIC_BASE_URL")
                    .unwrap_or_else(|_| default_public_base_url(&bind_address)),
                share_publicly: env_flag("SHARE_PUBLICLY", asset_defaults.share_publicly),
            },
            policy: SubmissionPolicy {
                append_on_upload_failure: env_flag(
                    "APPEND_ON_UPLOAD_FAILURE",
                    policy_defaults.append_on_upload_failure,
                ),
                cleanup_on_append_failure: env_flag(
                    "CLEANUP_ON_APPEND_FAILURE",
                    policy_defaults.cleanup_on_append_failure,
                ),
                placeholder_link: env_or("UPLOAD_PLACEHOLDER", &policy_defaults.placeholder_link),
            },
            credentials_file: std::env::var("GOOGLE_CREDENTIALS_FILE").ok(),
            max_upload_size,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.backend == CatalogBackend::Sheets && self.catalog.sheet_id == "local" {
            return Err(ConfigError::ValidationError(
                "SHEET_ID is required when CATALOG_BACKEND=sheets".to_string(),
            ));
        }

        if self.catalog.sheet_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "SHEET_ID cannot be empty".to_string(),
            ));
        }

        for (name, range) in [
            ("CATALOG_READ_RANGE", &self.catalog.read_range),
            ("CATALOG_APPEND_RANGE", &self.catalog.append_range),
        ] {
            if crate::catalog::store::sheet_name(range).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} '{range}' does not name a sheet"
                )));
            }
        }

        if self.assets.backend == AssetBackend::Gcs && self.assets.gcs_bucket.is_none() {
            return Err(ConfigError::ValidationError(
                "GCS_BUCKET is required when ASSET_BACKEND=gcs".to_string(),
            ));
        }

        if self.assets.backend == AssetBackend::Drive && self.assets.destination.is_none() {
            tracing::warn!(
                "DESTINATION_FOLDER is not set; Drive uploads will land in the service account's root folder"
            );
        }

        if self.max_upload_size == 0 {
            return Err(ConfigError::ValidationError(
                "MAX_UPLOAD_SIZE must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether any backend talks to Google and needs credentials.
    pub fn needs_google_auth(&self) -> bool {
        self.catalog.backend == CatalogBackend::Sheets || self.assets.backend != AssetBackend::Local
    }

    /// OAuth scopes for the configured backends.
    pub fn google_scopes(&self) -> Vec<&'static str> {
        let mut scopes = Vec::new();
        if self.catalog.backend == CatalogBackend::Sheets {
            scopes.push(crate::auth::SCOPE_SPREADSHEETS);
        }
        match self.assets.backend {
            AssetBackend::Drive => scopes.push(crate::auth::SCOPE_DRIVE),
            AssetBackend::Gcs => scopes.push(crate::auth::SCOPE_STORAGE),
            AssetBackend::Local => {}
        }
        scopes
    }
}

fn default_public_base_url(bind_address: &str) -> String {
    let port = bind_address.rsplit_once(':').map(|(_, p)| p).unwrap_or("8080");
    format!("http://localhost:{port}")
}
