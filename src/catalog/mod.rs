//! The catalog: an append-only spreadsheet of submitted slides, plus the
//! pure logic that turns its raw rows into something to browse.

pub mod link;
pub mod record;
pub mod schema;
pub mod search;
pub mod store;

pub use link::{derive_download, LinkDeriver};
pub use record::{Cell, Record, RowMapper};
pub use schema::{project_columns, CatalogEntry, CatalogSchema, Column, SchemaError};
pub use search::{distinct_keywords, filter_by_keyword, search};
pub use store::{AppendAck, CatalogError, CatalogStore, LocalCatalog, SheetsCatalog};
