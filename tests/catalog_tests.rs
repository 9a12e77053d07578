//! Browse-side behaviour of the catalog, through the public API.

use serde_json::json;
use slide_library::catalog::{
    derive_download, project_columns, search, Cell, LinkDeriver, Record, RowMapper,
};

fn sheet() -> Vec<Vec<Cell>> {
    vec![
        vec![json!("Title"), json!("Keywords"), json!("Link"), json!("Person")],
        vec![
            json!("Alpha helices"),
            json!("structure, proteins"),
            json!("https://drive.example/file/d/A1/view?usp=sharing"),
            json!("Alice"),
        ],
        vec![json!("Gel imaging"), json!("imaging"), json!("http://lab.example/gel.pdf")],
        vec![json!("Year in review"), json!(2024)],
    ]
}

fn records() -> Vec<Record> {
    let mapper = RowMapper::new(LinkDeriver::new("drive.example"));
    mapper.map_sheet(&sheet()).1
}

#[test]
fn test_drive_links_get_download_links() {
    let records = records();
    assert_eq!(
        records[0].get("Download"),
        Some("https://drive.example/uc?export=download&id=A1")
    );
    assert_eq!(records[1].get("Download"), Some("http://lab.example/gel.pdf"));
    assert_eq!(records[2].get("Download"), Some(""));
}

#[test]
fn test_passthrough_is_idempotent() {
    for link in ["http://lab.example/gel.pdf", "", "No file uploaded"] {
        let once = derive_download(link);
        assert_eq!(once, link);
        assert_eq!(derive_download(&once), once);
    }
}

#[test]
fn test_search_properties() {
    let records = records();

    assert_eq!(search(&records, ""), records);
    assert!(search(&records, "no such thing").is_empty());
    assert_eq!(search(&records, "ALPHA"), search(&records, "alpha"));

    // numeric cells are searchable as text
    let hits = search(&records, "2024");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].get("Title"), Some("Year in review"));

    // derived download links are searchable too
    assert_eq!(search(&records, "export=download").len(), 1);
}

#[test]
fn test_projection_order() {
    assert_eq!(
        project_columns(&["Keywords", "Title", "Unknown"], &["Title", "Keywords"]),
        vec!["Title", "Keywords"]
    );
}
