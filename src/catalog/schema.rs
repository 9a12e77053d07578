//! Explicit catalog schema: known columns, header aliases, typed entries and
//! the presentation projection.

use serde::Serialize;
use thiserror::Error;

use super::record::Record;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Catalog header is missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("Catalog has no header row")]
    NoHeader,
}

/// Columns the library knows how to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    Description,
    Keywords,
    Person,
    Link,
    Download,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::Title,
        Column::Description,
        Column::Keywords,
        Column::Person,
        Column::Link,
        Column::Download,
    ];

    /// Canonical header name.
    pub fn header(self) -> &'static str {
        match self {
            Column::Title => "Title",
            Column::Description => "Description",
            Column::Keywords => "Keywords",
            Column::Person => "Person",
            Column::Link => "Link",
            Column::Download => "Download",
        }
    }

    /// Resolve a header cell to a known column. Matching is case-insensitive
    /// and accepts the alternative names older sheets use.
    pub fn from_header(name: &str) -> Option<Column> {
        match name.trim().to_lowercase().as_str() {
            "title" | "name" | "file name" => Some(Column::Title),
            "description" => Some(Column::Description),
            "keywords" | "tags" => Some(Column::Keywords),
            "person" | "contact" | "presenter" => Some(Column::Person),
            "link" | "view link" => Some(Column::Link),
            "download" | "download link" => Some(Column::Download),
            _ => None,
        }
    }
}

/// Split a comma-separated keyword cell into trimmed, non-empty keywords.
pub fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Keep the desired columns that also appear in `actual`, in desired order.
pub fn project_columns<A, D>(actual: &[A], desired: &[D]) -> Vec<String>
where
    A: AsRef<str>,
    D: AsRef<str>,
{
    desired
        .iter()
        .map(AsRef::as_ref)
        .filter(|d| actual.iter().any(|a| a.as_ref() == *d))
        .map(str::to_string)
        .collect()
}

/// Typed view of a catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub person: Option<String>,
    pub link: Option<String>,
    pub download: Option<String>,
}

/// Which columns must exist and the order they are presented in.
#[derive(Debug, Clone)]
pub struct CatalogSchema {
    required: Vec<Column>,
    presentation: Vec<String>,
}

impl Default for CatalogSchema {
    fn default() -> Self {
        Self {
            required: vec![Column::Title],
            presentation: Column::ALL.iter().map(|c| c.header().to_string()).collect(),
        }
    }
}

impl CatalogSchema {
    pub fn new(required: Vec<Column>, presentation: Vec<String>) -> Self {
        Self {
            required,
            presentation,
        }
    }

    /// Check that every required column appears in `header`, under any alias.
    pub fn validate<S: AsRef<str>>(&self, header: &[S]) -> Result<(), SchemaError> {
        if header.iter().all(|h| h.as_ref().trim().is_empty()) {
            return Err(SchemaError::NoHeader);
        }
        for column in &self.required {
            let present = header
                .iter()
                .any(|h| Column::from_header(h.as_ref()) == Some(*column));
            if !present {
                return Err(SchemaError::MissingColumn(column.header()));
            }
        }
        Ok(())
    }

    /// Presentation columns available for a mapped record set. Aliased
    /// headers count under their canonical name. Derived columns (Download)
    /// count as present when any record carries them.
    pub fn display_columns(&self, header: &[String], records: &[Record]) -> Vec<String> {
        let names = header
            .iter()
            .map(String::as_str)
            .chain(records.iter().flat_map(|r| r.columns()));

        let mut available: Vec<&str> = Vec::new();
        for name in names {
            let name = Column::from_header(name).map_or(name, |c| c.header());
            if !available.contains(&name) {
                available.push(name);
            }
        }
        project_columns(&available, &self.presentation)
    }

    /// Typed accessors over a record. Missing optional columns and empty cells are `None`.
    pub fn entry(&self, record: &Record) -> CatalogEntry {
        let text = |column| record.get_column(column).unwrap_or_default().to_string();
        let optional = |column| {
            record
                .get_column(column)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        CatalogEntry {
            title: text(Column::Title),
            description: text(Column::Description),
            keywords: split_keywords(record.get_column(Column::Keywords).unwrap_or_default()),
            person: optional(Column::Person),
            link: optional(Column::Link),
            download: optional(Column::Download),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_columns_drops_unknown_and_reorders() {
        let actual = ["Keywords", "Title", "Unknown"];
        let desired = ["Title", "Keywords"];
        assert_eq!(project_columns(&actual, &desired), vec!["Title", "Keywords"]);
    }

    #[test]
    fn test_project_columns_skips_absent_desired() {
        let actual = ["Title"];
        assert_eq!(
            project_columns(&actual, &["Title", "Description", "Link"]),
            vec!["Title"]
        );
    }

    #[test]
    fn test_validate_requires_title() {
        let schema = CatalogSchema::default();
        assert!(schema.validate(&["Title", "Link"]).is_ok());
        assert!(schema.validate(&["name", "Link"]).is_ok());
        assert_eq!(
            schema.validate(&["Description", "Link"]),
            Err(SchemaError::MissingColumn("Title"))
        );
        assert_eq!(schema.validate::<&str>(&[]), Err(SchemaError::NoHeader));
    }

    #[test]
    fn test_header_aliases() {
        assert_eq!(Column::from_header(" TITLE "), Some(Column::Title));
        assert_eq!(Column::from_header("Contact"), Some(Column::Person));
        assert_eq!(Column::from_header("Download Link"), Some(Column::Download));
        assert_eq!(Column::from_header("Unknown"), None);
    }

    #[test]
    fn test_entry_typed_accessors() {
        let record: Record = [
            ("Title", "Talk"),
            ("Keywords", "cells, imaging ,, "),
            ("Person", " "),
            ("Link", "http://x"),
        ]
        .into_iter()
        .collect();

        let entry = CatalogSchema::default().entry(&record);
        assert_eq!(entry.title, "Talk");
        assert_eq!(entry.description, "");
        assert_eq!(entry.keywords, vec!["cells", "imaging"]);
        assert_eq!(entry.person, None);
        assert_eq!(entry.link.as_deref(), Some("http://x"));
        assert_eq!(entry.download, None);
    }

    #[test]
    fn test_display_columns_include_derived_download() {
        let header = vec!["Link".to_string(), "Title".to_string(), "Extra".to_string()];
        let record: Record = [("Link", "l"), ("Title", "t"), ("Extra", "e"), ("Download", "d")]
            .into_iter()
            .collect();

        let columns = CatalogSchema::default().display_columns(&header, &[record]);
        assert_eq!(columns, vec!["Title", "Link", "Download"]);
    }

    #[test]
    fn test_display_columns_resolve_aliases() {
        let header = vec![
            "File Name".to_string(),
            "Description".to_string(),
            "View Link".to_string(),
        ];
        let columns = CatalogSchema::default().display_columns(&header, &[]);
        assert_eq!(columns, vec!["Title", "Description", "Link"]);
    }
}
