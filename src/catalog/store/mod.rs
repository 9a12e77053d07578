mod local;
mod sheets;

pub use local::LocalCatalog;
pub use sheets::SheetsCatalog;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use super::record::Cell;
use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Invalid range '{0}'")]
    InvalidRange(String),
    #[error("Catalog service error: {0}")]
    Remote(String),
    #[error("Local catalog error: {0}")]
    Local(String),
}

/// Acknowledgement of a single appended row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppendAck {
    /// A1 range the row landed in, when the backend reports it.
    pub updated_range: Option<String>,
    pub updated_rows: u64,
}

/// Append-only tabular store backing the catalog.
///
/// Ranges use A1 notation (`Sheet1!A:Z`). The first row returned by
/// [`read_all`](CatalogStore::read_all) is the header.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn read_all(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<Cell>>, CatalogError>;
    async fn append_row(
        &self,
        sheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<AppendAck, CatalogError>;
}

/// Sheet (tab) name of an A1 range. `Sheet1!A:Z` and `Sheet1` both give
/// `Sheet1`; quoted names (`'My Sheet'!A1`) are unquoted.
pub fn sheet_name(range: &str) -> Result<String, CatalogError> {
    let name = match range.rsplit_once('!') {
        Some((name, _)) => name,
        None => range,
    }
    .trim();

    let name = match name.strip_prefix('\'').and_then(|n| n.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => name.to_string(),
    };

    if name.is_empty() {
        return Err(CatalogError::InvalidRange(range.to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_name_from_ranges() {
        assert_eq!(sheet_name("Sheet1!A:Z").unwrap(), "Sheet1");
        assert_eq!(sheet_name("Sheet1!A1").unwrap(), "Sheet1");
        assert_eq!(sheet_name("Catalog").unwrap(), "Catalog");
        assert_eq!(sheet_name("'Slide Deck''s'!A:E").unwrap(), "Slide Deck's");
    }

    #[test]
    fn test_sheet_name_rejects_empty() {
        assert!(matches!(sheet_name("!A1"), Err(CatalogError::InvalidRange(_))));
        assert!(matches!(sheet_name(""), Err(CatalogError::InvalidRange(_))));
    }
}
