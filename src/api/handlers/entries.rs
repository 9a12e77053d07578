use axum::extract::{Multipart, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::library_error;
use crate::api::response::{ApiError, AppQuery, JSend, JSendPaginated, Pagination};
use crate::asset_store::UploadedAsset;
use crate::catalog::{CatalogEntry, Record};
use crate::library::{BrowseQuery, Submission, SubmitOutcome};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListEntriesParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
}

fn default_limit() -> u32 {
    50
}

impl ListEntriesParams {
    fn browse_query(&self) -> BrowseQuery {
        BrowseQuery {
            q: self.q.clone(),
            keyword: self.keyword.clone(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<JSend<SubmitOutcome>>, ApiError> {
    let mut submission = Submission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let content_type = field.content_type().map(|s| s.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

            if data.len() as u64 > state.config.max_upload_size {
                return Err(ApiError::payload_too_large(format!(
                    "File exceeds maximum upload size of {} bytes",
                    state.config.max_upload_size
                )));
            }

            // Browsers send an empty, unnamed part when no file was chosen
            if !filename.is_empty() || !data.is_empty() {
                submission.file = Some(UploadedAsset {
                    filename: if filename.is_empty() {
                        "upload".to_string()
                    } else {
                        filename
                    },
                    content: data,
                    content_type,
                });
            }
            continue;
        }

        let slot = match field_name.as_str() {
            "title" | "name" => &mut submission.title,
            "description" => &mut submission.description,
            "keywords" => &mut submission.keywords,
            "person" | "contact" => &mut submission.person,
            "link" => submission.link.get_or_insert_with(String::new),
            _ => continue, // Ignore unknown fields
        };
        *slot = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid {field_name}: {e}")))?;
    }

    let outcome = state
        .library
        .submit(submission)
        .await
        .map_err(library_error)?;

    Ok(JSend::success(outcome))
}

pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListEntriesParams>,
) -> Result<Json<JSendPaginated<Record>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let view = state
        .library
        .browse(&params.browse_query())
        .await
        .map_err(library_error)?;

    Ok(paginate(view.rows, &params))
}

pub async fn list_typed_entries(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<ListEntriesParams>,
) -> Result<Json<JSendPaginated<CatalogEntry>>, ApiError> {
    if params.limit == 0 {
        return Err(ApiError::bad_request("limit must be greater than 0"));
    }

    let view = state
        .library
        .browse(&params.browse_query())
        .await
        .map_err(library_error)?;

    Ok(paginate(view.entries, &params))
}

pub async fn list_keywords(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<KeywordsResponse>>, ApiError> {
    let view = state
        .library
        .browse(&BrowseQuery::default())
        .await
        .map_err(library_error)?;

    Ok(JSend::success(KeywordsResponse {
        keywords: view.keywords,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

fn paginate<T: Serialize>(items: Vec<T>, params: &ListEntriesParams) -> Json<JSendPaginated<T>> {
    let total = items.len() as u64;
    let items: Vec<T> = items
        .into_iter()
        .skip(params.offset as usize)
        .take(params.limit as usize)
        .collect();

    JSendPaginated::success(
        items,
        Pagination {
            limit: params.limit,
            offset: params.offset,
            total,
        },
    )
}
