use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};

use super::{sheet_name, AppendAck, CatalogError, CatalogStore};
use crate::catalog::record::Cell;

/// Catalog rows: "<sheet_id>/<tab>\0<seq:020>" -> msgpack Vec<String>
const CATALOG_ROWS: TableDefinition<&str, &[u8]> = TableDefinition::new("catalog_rows");

/// Row count per sheet: "<sheet_id>/<tab>" -> number of rows written
const CATALOG_LENGTHS: TableDefinition<&str, u64> = TableDefinition::new("catalog_lengths");

/// Embedded catalog for development and tests, stored in redb.
///
/// Rows come back in append order. Every append is a single write
/// transaction, so concurrent appends never interleave within a row.
pub struct LocalCatalog {
    db: Arc<Database>,
}

impl Clone for LocalCatalog {
    fn clone(&self) -> Self {
        Self {
            db: Arc::clone(&self.db),
        }
    }
}

fn local_err(e: impl std::fmt::Display) -> CatalogError {
    CatalogError::Local(e.to_string())
}

fn sheet_key(sheet_id: &str, range: &str) -> Result<String, CatalogError> {
    Ok(format!("{sheet_id}/{}", sheet_name(range)?))
}

fn row_key(sheet: &str, seq: u64) -> String {
    format!("{sheet}\0{seq:020}")
}

impl LocalCatalog {
    /// Open or create `catalog.redb` inside `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, CatalogError> {
        std::fs::create_dir_all(data_dir.as_ref()).map_err(local_err)?;
        let db = Database::create(data_dir.as_ref().join("catalog.redb")).map_err(local_err)?;

        let write_txn = db.begin_write().map_err(local_err)?;
        {
            let _ = write_txn.open_table(CATALOG_ROWS).map_err(local_err)?;
            let _ = write_txn.open_table(CATALOG_LENGTHS).map_err(local_err)?;
        }
        write_txn.commit().map_err(local_err)?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Number of rows (header included) stored for a sheet.
    pub fn row_count(&self, sheet_id: &str, range: &str) -> Result<u64, CatalogError> {
        let key = sheet_key(sheet_id, range)?;
        let read_txn = self.db.begin_read().map_err(local_err)?;
        let lengths = read_txn.open_table(CATALOG_LENGTHS).map_err(local_err)?;
        Ok(lengths
            .get(key.as_str())
            .map_err(local_err)?
            .map(|v| v.value())
            .unwrap_or(0))
    }

    /// Write `header` as the first row if the sheet is empty. Returns true if it was written.
    pub fn ensure_header(
        &self,
        sheet_id: &str,
        range: &str,
        header: &[String],
    ) -> Result<bool, CatalogError> {
        let key = sheet_key(sheet_id, range)?;
        let write_txn = self.db.begin_write().map_err(local_err)?;
        let written = {
            let mut lengths = write_txn.open_table(CATALOG_LENGTHS).map_err(local_err)?;
            let len = lengths
                .get(key.as_str())
                .map_err(local_err)?
                .map(|v| v.value())
                .unwrap_or(0);

            if len == 0 {
                let data = rmp_serde::to_vec(header).map_err(local_err)?;
                let mut rows = write_txn.open_table(CATALOG_ROWS).map_err(local_err)?;
                rows.insert(row_key(&key, 0).as_str(), data.as_slice())
                    .map_err(local_err)?;
                lengths.insert(key.as_str(), 1u64).map_err(local_err)?;
                true
            } else {
                false
            }
        };
        write_txn.commit().map_err(local_err)?;

        if written {
            tracing::info!(sheet = %key, "Initialized local catalog header");
        }
        Ok(written)
    }
}

#[async_trait]
impl CatalogStore for LocalCatalog {
    async fn read_all(&self, sheet_id: &str, range: &str) -> Result<Vec<Vec<Cell>>, CatalogError> {
        let key = sheet_key(sheet_id, range)?;
        let start = format!("{key}\0");
        let end = format!("{key}\u{1}");

        let read_txn = self.db.begin_read().map_err(local_err)?;
        let table = read_txn.open_table(CATALOG_ROWS).map_err(local_err)?;

        let mut rows = Vec::new();
        for entry in table.range(start.as_str()..end.as_str()).map_err(local_err)? {
            let (_, value) = entry.map_err(local_err)?;
            let row: Vec<String> = rmp_serde::from_slice(value.value()).map_err(local_err)?;
            rows.push(row.into_iter().map(Cell::String).collect());
        }

        Ok(rows)
    }

    async fn append_row(
        &self,
        sheet_id: &str,
        range: &str,
        row: &[String],
    ) -> Result<AppendAck, CatalogError> {
        let key = sheet_key(sheet_id, range)?;
        let data = rmp_serde::to_vec(row).map_err(local_err)?;

        let write_txn = self.db.begin_write().map_err(local_err)?;
        let seq = {
            let mut lengths = write_txn.open_table(CATALOG_LENGTHS).map_err(local_err)?;
            let seq = lengths
                .get(key.as_str())
                .map_err(local_err)?
                .map(|v| v.value())
                .unwrap_or(0);

            let mut rows = write_txn.open_table(CATALOG_ROWS).map_err(local_err)?;
            rows.insert(row_key(&key, seq).as_str(), data.as_slice())
                .map_err(local_err)?;
            lengths.insert(key.as_str(), seq + 1).map_err(local_err)?;
            seq
        };
        write_txn.commit().map_err(local_err)?;

        let tab = sheet_name(range)?;
        Ok(AppendAck {
            updated_range: Some(format!("{tab}!A{}", seq + 1)),
            updated_rows: 1,
        })
    }
}
