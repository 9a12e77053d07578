use super::record::Record;
use super::schema::{split_keywords, Column};

/// Case-insensitive substring search across every field of every record.
///
/// A blank or whitespace-only query returns all records. Any other query is
/// matched as given, surrounding spaces included. Source order is preserved.
pub fn search(records: &[Record], query: &str) -> Vec<Record> {
    if query.trim().is_empty() {
        return records.to_vec();
    }
    let needle = query.to_lowercase();

    records
        .iter()
        .filter(|record| record.values().any(|v| v.to_lowercase().contains(&needle)))
        .cloned()
        .collect()
}

/// Keep records tagged with `keyword` in their Keywords column.
pub fn filter_by_keyword(records: &[Record], keyword: &str) -> Vec<Record> {
    let wanted = keyword.trim().to_lowercase();
    if wanted.is_empty() {
        return records.to_vec();
    }

    records
        .iter()
        .filter(|record| {
            record
                .get_column(Column::Keywords)
                .map(split_keywords)
                .unwrap_or_default()
                .iter()
                .any(|k| k.to_lowercase() == wanted)
        })
        .cloned()
        .collect()
}

/// Distinct keywords across the catalog, sorted case-insensitively.
pub fn distinct_keywords(records: &[Record]) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for record in records {
        let Some(raw) = record.get_column(Column::Keywords) else {
            continue;
        };
        for keyword in split_keywords(raw) {
            let folded = keyword.to_lowercase();
            if !keywords.iter().any(|k| k.to_lowercase() == folded) {
                keywords.push(keyword);
            }
        }
    }
    keywords.sort_by_key(|k| k.to_lowercase());
    keywords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            [("Title", "Alpha talk"), ("Keywords", "cells, imaging")]
                .into_iter()
                .collect(),
            [("Title", "Beta"), ("Keywords", "Genomics")].into_iter().collect(),
            [("Title", "Gamma"), ("Keywords", "alpha-helix, Imaging")]
                .into_iter()
                .collect(),
        ]
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let all = records();
        assert_eq!(search(&all, ""), all);
        assert_eq!(search(&all, "   "), all);
    }

    #[test]
    fn test_no_match_returns_empty() {
        assert!(search(&records(), "zebrafish").is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_and_ordered() {
        let all = records();
        let upper = search(&all, "ALPHA");
        let lower = search(&all, "alpha");
        assert_eq!(upper, lower);
        assert_eq!(upper.len(), 2);
        assert_eq!(upper[0].get("Title"), Some("Alpha talk"));
        assert_eq!(upper[1].get("Title"), Some("Gamma"));
    }

    #[test]
    fn test_search_matches_any_field() {
        let hits = search(&records(), "genom");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get("Title"), Some("Beta"));
    }

    #[test]
    fn test_query_spaces_are_significant() {
        let all: Vec<Record> = vec![[("Title", "Alphatalk")].into_iter().collect()];
        assert!(search(&all, " talk").is_empty());
        assert_eq!(search(&all, "talk").len(), 1);
    }

    #[test]
    fn test_non_ascii_keywords_fold_consistently() {
        let all: Vec<Record> = vec![
            [("Title", "A"), ("Keywords", "Ökologie")].into_iter().collect(),
            [("Title", "B"), ("Keywords", "ökologie")].into_iter().collect(),
        ];
        assert_eq!(distinct_keywords(&all), vec!["Ökologie"]);
        assert_eq!(filter_by_keyword(&all, "ÖKOLOGIE").len(), 2);
    }

    #[test]
    fn test_filter_by_keyword_matches_whole_keywords() {
        let all = records();
        let imaging = filter_by_keyword(&all, "imaging");
        assert_eq!(imaging.len(), 2);

        assert!(filter_by_keyword(&all, "alpha").is_empty());
        assert_eq!(filter_by_keyword(&all, ""), all);
    }

    #[test]
    fn test_distinct_keywords_sorted_and_deduplicated() {
        assert_eq!(
            distinct_keywords(&records()),
            vec!["alpha-helix", "cells", "Genomics", "imaging"]
        );
    }
}
