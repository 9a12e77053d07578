//! Submission and browse flows over the catalog and asset stores.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset_store::{AssetStore, StoredAsset, UploadError, UploadedAsset};
use crate::auth::AuthError;
use crate::catalog::schema::split_keywords;
use crate::catalog::{
    distinct_keywords, filter_by_keyword, search, AppendAck, CatalogEntry, CatalogError,
    CatalogSchema, CatalogStore, LinkDeriver, Record, RowMapper, SchemaError,
};
use crate::config::{CatalogConfig, RowLayout, SubmissionPolicy};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("Authentication failed: {0}")]
    Auth(AuthError),
    #[error("Failed to read catalog: {0}")]
    Read(CatalogError),
    #[error("Failed to upload file: {0}")]
    Upload(UploadError),
    #[error("Failed to record catalog entry: {0}")]
    Append(CatalogError),
}

fn read_error(e: CatalogError) -> LibraryError {
    match e {
        CatalogError::Auth(auth) => LibraryError::Auth(auth),
        other => LibraryError::Read(other),
    }
}

fn append_error(e: CatalogError) -> LibraryError {
    match e {
        CatalogError::Auth(auth) => LibraryError::Auth(auth),
        other => LibraryError::Append(other),
    }
}

/// A form submission: metadata plus an optional file.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub person: String,
    /// Link to use when no file is attached.
    pub link: Option<String>,
    pub file: Option<UploadedAsset>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    /// The row as appended to the catalog.
    pub row: Vec<String>,
    pub link: String,
    pub download: String,
    pub asset: Option<StoredAsset>,
    /// Set when the upload failed and the row was recorded with the placeholder link.
    pub upload_warning: Option<String>,
    pub ack: AppendAck,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

/// Filtered catalog, ready to present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CatalogView {
    /// Raw header of the sheet.
    pub header: Vec<String>,
    /// Presentation columns, in display order.
    pub columns: Vec<String>,
    /// Matching records projected onto `columns`.
    pub rows: Vec<Record>,
    /// The same matches as typed entries.
    pub entries: Vec<CatalogEntry>,
    /// Every keyword in the catalog, for the filter list.
    pub keywords: Vec<String>,
    /// Data rows in the catalog before filtering.
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub sheet_id: String,
    pub range: String,
    pub header: Vec<String>,
    pub rows: usize,
}

/// The slide library: one catalog, one asset store, one policy.
pub struct Library {
    catalog: Arc<dyn CatalogStore>,
    assets: Arc<dyn AssetStore>,
    settings: CatalogConfig,
    destination: Option<String>,
    policy: SubmissionPolicy,
    deriver: LinkDeriver,
    mapper: RowMapper,
    schema: CatalogSchema,
}

impl Library {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        assets: Arc<dyn AssetStore>,
        settings: CatalogConfig,
        destination: Option<String>,
        policy: SubmissionPolicy,
    ) -> Self {
        let deriver = LinkDeriver::new(settings.drive_host.clone());
        Self {
            catalog,
            assets,
            settings,
            destination,
            policy,
            mapper: RowMapper::new(deriver.clone()),
            deriver,
            schema: CatalogSchema::default(),
        }
    }

    pub fn with_schema(mut self, schema: CatalogSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn settings(&self) -> &CatalogConfig {
        &self.settings
    }

    /// Upload the file (if any) and append the entry to the catalog.
    pub async fn submit(&self, submission: Submission) -> Result<SubmitOutcome, LibraryError> {
        let title = required(&submission.title, "title")?;
        let description = required(&submission.description, "description")?;
        let keywords = normalize_keywords(&submission.keywords);
        let person = submission.person.trim().to_string();

        let mut upload_warning = None;
        let asset = match &submission.file {
            Some(file) => match self.assets.upload(file, self.destination.as_deref()).await {
                Ok(stored) => Some(stored),
                Err(UploadError::Auth(e)) => return Err(LibraryError::Auth(e)),
                Err(e) if self.policy.append_on_upload_failure => {
                    tracing::warn!(
                        error = %e,
                        filename = %file.filename,
                        "Upload failed, recording entry with placeholder link"
                    );
                    upload_warning = Some(format!("Failed to upload file: {e}"));
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, filename = %file.filename, "Upload failed");
                    return Err(LibraryError::Upload(e));
                }
            },
            None => None,
        };

        let link = match &asset {
            Some(stored) => stored.url.clone(),
            None => submission
                .link
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.policy.placeholder_link.clone()),
        };

        let row = build_row(
            self.settings.row_layout,
            &title,
            &description,
            &keywords,
            &link,
            &person,
        );

        let ack = match self
            .catalog
            .append_row(&self.settings.sheet_id, &self.settings.append_range, &row)
            .await
        {
            Ok(ack) => ack,
            Err(e) => {
                tracing::error!(error = %e, title = %title, "Catalog append failed");
                if let Some(stored) = &asset {
                    self.discard_asset(stored).await;
                }
                return Err(append_error(e));
            }
        };

        tracing::info!(
            title = %title,
            link = %link,
            range = ack.updated_range.as_deref().unwrap_or_default(),
            "Recorded catalog entry"
        );

        Ok(SubmitOutcome {
            download: self.deriver.derive(&link),
            row,
            link,
            asset,
            upload_warning,
            ack,
        })
    }

    async fn discard_asset(&self, stored: &StoredAsset) {
        if !self.policy.cleanup_on_append_failure {
            tracing::warn!(asset_id = %stored.id, "Uploaded asset left without a catalog entry");
            return;
        }
        match self.assets.delete(&stored.id).await {
            Ok(()) => tracing::info!(asset_id = %stored.id, "Removed orphaned upload"),
            Err(e) => {
                tracing::warn!(asset_id = %stored.id, error = %e, "Failed to remove orphaned upload")
            }
        }
    }

    /// Read the whole catalog and apply the search and keyword filters.
    pub async fn browse(&self, query: &BrowseQuery) -> Result<CatalogView, LibraryError> {
        let raw = self
            .catalog
            .read_all(&self.settings.sheet_id, &self.settings.read_range)
            .await
            .map_err(read_error)?;

        if raw.is_empty() {
            return Ok(CatalogView::default());
        }

        let (header, records) = self.mapper.map_sheet(&raw);
        self.schema.validate(&header)?;

        let keywords = distinct_keywords(&records);
        let matched = search(&records, query.q.as_deref().unwrap_or_default());
        let matched = filter_by_keyword(&matched, query.keyword.as_deref().unwrap_or_default());

        let columns = self.schema.display_columns(&header, &records);
        let rows = matched.iter().map(|r| r.project(&columns)).collect();
        let entries = matched.iter().map(|r| self.schema.entry(r)).collect();

        Ok(CatalogView {
            total: records.len(),
            header,
            columns,
            rows,
            entries,
            keywords,
        })
    }

    /// Header and row count of the backing sheet.
    pub async fn status(&self) -> Result<CatalogStatus, LibraryError> {
        let raw = self
            .catalog
            .read_all(&self.settings.sheet_id, &self.settings.read_range)
            .await
            .map_err(read_error)?;

        let header = raw.first().map(|h| RowMapper::header(h)).unwrap_or_default();
        Ok(CatalogStatus {
            sheet_id: self.settings.sheet_id.clone(),
            range: self.settings.read_range.clone(),
            header,
            rows: raw.len().saturating_sub(1),
        })
    }
}

fn required(value: &str, field: &str) -> Result<String, LibraryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// `"a, b,,c "` -> `"a, b, c"`
pub fn normalize_keywords(raw: &str) -> String {
    split_keywords(raw).join(", ")
}

pub fn build_row(
    layout: RowLayout,
    title: &str,
    description: &str,
    keywords: &str,
    link: &str,
    person: &str,
) -> Vec<String> {
    let mut row = vec![
        title.to_string(),
        description.to_string(),
        keywords.to_string(),
        link.to_string(),
    ];
    if layout == RowLayout::WithPerson {
        row.push(person.to_string());
    }
    row
}
