use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{AppendAck, CatalogError, CatalogStore};
use crate::auth::GoogleAuth;
use crate::catalog::record::Cell;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Google Sheets v4 catalog backend.
pub struct SheetsCatalog {
    auth: Arc<GoogleAuth>,
    base_url: String,
    client: Client,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Cell>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<UpdateValuesResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateValuesResponse {
    #[serde(default)]
    updated_range: Option<String>,
    #[serde(default)]
    updated_rows: Option<u64>,
}

impl SheetsCatalog {
    pub fn new(auth: Arc<GoogleAuth>) -> Result<Self, CatalogError> {
        Self::with_base_url(auth, SHEETS_API_BASE)
    }

    /// Point at a different API root (emulators, proxies).
    pub fn with_base_url(auth: Arc<GoogleAuth>, base_url: &str) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .build()
            .map_err(|e| CatalogError::Remote(e.to_string()))?;

        Ok(Self {
            auth,
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// `<base>/<sheet_id>/values/<range><suffix>`, with each segment percent-encoded.
    fn values_url(&self, sheet_id: &str, range: &str, suffix: &str) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CatalogError::Remote(format!("invalid API base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::Remote("API base URL cannot have a path".into()))?
            .push(sheet_id)
            .push("values")
            .push(&format!("{range}{suffix}"));
        Ok(url)
    }
}

#[async_trait]
impl CatalogStore for SheetsCatalog {
    async fn read_all(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<Cell>>, CatalogError> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(sheet_id, range, "")?;

        let resp = self
            .client
            .get(url)
            .bearer_auth(&token)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await
            .map_err(|e| CatalogError::Remote(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Remote(format!(
                "Sheets read failed ({status}): {body}"
            )));
        }

        let range: ValueRange = resp
            .json()
            .await
            .map_err(|e| CatalogError::Remote(e.to_string()))?;

        Ok(range.values)
    }

    async fn append_row(
        &self,
        sheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<AppendAck, CatalogError> {
        let token = self.auth.access_token().await?;
        let url = self.values_url(sheet_id, range, ":append")?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(&token)
            .query(&[
                ("valueInputOption", "USER_ENTERED"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .json(&serde_json::json!({ "values": [row] }))
            .send()
            .await
            .map_err(|e| CatalogError::Remote(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Remote(format!(
                "Sheets append failed ({status}): {body}"
            )));
        }

        let body: AppendResponse = resp
            .json()
            .await
            .map_err(|e| CatalogError::Remote(e.to_string()))?;

        let updates = body.updates;
        Ok(AppendAck {
            updated_range: updates.as_ref().and_then(|u| u.updated_range.clone()),
            updated_rows: updates.and_then(|u| u.updated_rows).unwrap_or(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenSource, SCOPE_SPREADSHEETS};

    fn catalog() -> SheetsCatalog {
        let auth = GoogleAuth::lazy(TokenSource::Static("t".into()), &[SCOPE_SPREADSHEETS]).unwrap();
        SheetsCatalog::new(Arc::new(auth)).unwrap()
    }

    #[test]
    fn test_values_url_encodes_range() {
        let url = catalog()
            .values_url("abc123", "'My Sheet'!A:Z", "")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/'My%20Sheet'!A:Z"
        );
    }

    #[test]
    fn test_append_url_suffix() {
        let url = catalog().values_url("abc123", "Sheet1!A1", ":append").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Sheet1!A1:append"
        );
    }

    #[test]
    fn test_value_range_without_values_is_empty() {
        let range: ValueRange = serde_json::from_str(r#"{"range":"Sheet1!A1:Z1000"}"#).unwrap();
        assert!(range.values.is_empty());
    }
}
