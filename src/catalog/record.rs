use serde::ser::SerializeMap;
use serde::Serialize;

use super::link::LinkDeriver;
use super::schema::Column;

/// A raw spreadsheet cell as returned by the catalog store.
pub type Cell = serde_json::Value;

/// Render a cell as display text. Null-like cells become empty strings.
pub fn cell_to_string(cell: &Cell) -> String {
    match cell {
        Cell::Null => String::new(),
        Cell::String(s) => s.clone(),
        Cell::Bool(b) => b.to_string(),
        Cell::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// One catalog row keyed by column name, in header order.
///
/// Column names are free-form; typed access goes through
/// [`CatalogSchema`](super::schema::CatalogSchema).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing the value if the column already exists.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// First field whose header resolves to `column`, honouring header aliases.
    pub fn get_column(&self, column: Column) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| Column::from_header(name) == Some(column))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Keep only `columns`, in that order. Known columns are looked up under
    /// any header alias. Columns the record lacks are skipped.
    pub fn project(&self, columns: &[String]) -> Record {
        let fields = columns
            .iter()
            .filter_map(|c| {
                let value = match Column::from_header(c) {
                    Some(column) => self.get_column(column),
                    None => self.get(c),
                };
                value.map(|v| (c.clone(), v.to_string()))
            })
            .collect();
        Record { fields }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Maps raw catalog rows onto [`Record`]s and fills in derived download links.
#[derive(Debug, Clone, Default)]
pub struct RowMapper {
    deriver: LinkDeriver,
}

impl RowMapper {
    pub fn new(deriver: LinkDeriver) -> Self {
        Self { deriver }
    }

    /// Clean header names. Blank names are kept as empty strings so positions still line up.
    pub fn header(raw: &[Cell]) -> Vec<String> {
        raw.iter().map(|c| cell_to_string(c).trim().to_string()).collect()
    }

    /// Map one data row against `header`. Missing trailing cells read as empty,
    /// cells past the end of the header are dropped.
    pub fn map_row(&self, header: &[String], row: &[Cell]) -> Record {
        let mut record = Record::new();
        for (i, name) in header.iter().enumerate() {
            if name.is_empty() || record.contains(name) {
                continue;
            }
            let value = row.get(i).map(cell_to_string).unwrap_or_default();
            record.insert(name.clone(), value);
        }

        let derived = record
            .get_column(Column::Link)
            .filter(|_| record.get_column(Column::Download).is_none_or(str::is_empty))
            .map(|link| self.deriver.derive(link));
        if let Some(download) = derived {
            // Fill an empty "Download Link" cell in place rather than shadowing it.
            let name = record
                .columns()
                .find(|c| Column::from_header(c) == Some(Column::Download))
                .unwrap_or(Column::Download.header())
                .to_string();
            record.insert(name, download);
        }

        record
    }

    pub fn map_rows(&self, header: &[String], rows: &[Vec<Cell>]) -> Vec<Record> {
        rows.iter().map(|row| self.map_row(header, row)).collect()
    }

    /// Split a full sheet read (header first) into header names and records.
    pub fn map_sheet(&self, rows: &[Vec<Cell>]) -> (Vec<String>, Vec<Record>) {
        match rows.split_first() {
            Some((header_row, data)) => {
                let header = Self::header(header_row);
                let records = self.map_rows(&header, data);
                (header, records)
            }
            None => (Vec::new(), Vec::new()),
        }
    }
}
