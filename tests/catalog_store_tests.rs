use serde_json::json;
use slide_library::catalog::{CatalogStore, LocalCatalog};

const SHEET: &str = "sheet-abc";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn test_catalog() -> (tempfile::TempDir, LocalCatalog) {
    let dir = tempfile::tempdir().unwrap();
    let catalog = LocalCatalog::open(dir.path().join("data")).unwrap();
    (dir, catalog)
}

#[tokio::test]
async fn test_append_to_empty_catalog() {
    let (_dir, catalog) = test_catalog();
    let header = strings(&["Title", "Description", "Keywords", "Link", "Person"]);
    catalog.ensure_header(SHEET, "Sheet1!A1", &header).unwrap();

    let row = strings(&["T", "D", "k1,k2", "http://x", "Alice"]);
    let ack = catalog.append_row(SHEET, "Sheet1!A1", &row).await.unwrap();
    assert_eq!(ack.updated_rows, 1);
    assert_eq!(ack.updated_range.as_deref(), Some("Sheet1!A2"));

    let rows = catalog.read_all(SHEET, "Sheet1!A:Z").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(
        rows[0],
        vec![json!("Title"), json!("Description"), json!("Keywords"), json!("Link"), json!("Person")]
    );
    assert_eq!(
        rows[1],
        vec![json!("T"), json!("D"), json!("k1,k2"), json!("http://x"), json!("Alice")]
    );
}

#[tokio::test]
async fn test_read_empty_sheet() {
    let (_dir, catalog) = test_catalog();
    assert!(catalog.read_all(SHEET, "Sheet1!A:Z").await.unwrap().is_empty());
    assert_eq!(catalog.row_count(SHEET, "Sheet1").unwrap(), 0);
}

#[tokio::test]
async fn test_rows_keep_append_order() {
    let (_dir, catalog) = test_catalog();
    catalog
        .ensure_header(SHEET, "Sheet1!A1", &strings(&["Title"]))
        .unwrap();

    for i in 0..12 {
        catalog
            .append_row(SHEET, "Sheet1!A1", &[format!("entry {i}")])
            .await
            .unwrap();
    }

    let rows = catalog.read_all(SHEET, "Sheet1!A:Z").await.unwrap();
    assert_eq!(rows.len(), 13);
    for (i, row) in rows.iter().skip(1).enumerate() {
        assert_eq!(row[0], json!(format!("entry {i}")));
    }
}

#[tokio::test]
async fn test_ensure_header_only_once() {
    let (_dir, catalog) = test_catalog();
    assert!(catalog
        .ensure_header(SHEET, "Sheet1!A1", &strings(&["Title"]))
        .unwrap());
    assert!(!catalog
        .ensure_header(SHEET, "Sheet1!A1", &strings(&["Other"]))
        .unwrap());

    let rows = catalog.read_all(SHEET, "Sheet1").await.unwrap();
    assert_eq!(rows, vec![vec![json!("Title")]]);
}

#[tokio::test]
async fn test_sheets_and_tabs_are_isolated() {
    let (_dir, catalog) = test_catalog();
    catalog
        .append_row(SHEET, "Sheet1!A1", &strings(&["in sheet1"]))
        .await
        .unwrap();
    catalog
        .append_row(SHEET, "Archive!A1", &strings(&["in archive"]))
        .await
        .unwrap();
    catalog
        .append_row("other-sheet", "Sheet1!A1", &strings(&["elsewhere"]))
        .await
        .unwrap();

    let rows = catalog.read_all(SHEET, "Sheet1!A:Z").await.unwrap();
    assert_eq!(rows, vec![vec![json!("in sheet1")]]);
    assert_eq!(catalog.row_count(SHEET, "Archive!A:Z").unwrap(), 1);
    assert_eq!(catalog.row_count("other-sheet", "Sheet1").unwrap(), 1);
}

#[tokio::test]
async fn test_catalog_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let catalog = LocalCatalog::open(dir.path()).unwrap();
        catalog
            .append_row(SHEET, "Sheet1!A1", &strings(&["Title"]))
            .await
            .unwrap();
    }

    let catalog = LocalCatalog::open(dir.path()).unwrap();
    assert_eq!(catalog.read_all(SHEET, "Sheet1!A:Z").await.unwrap().len(), 1);
}
