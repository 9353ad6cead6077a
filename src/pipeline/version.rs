//! Per-document version decisioning.
//!
//! Compares the stored version marker against the canonical rendering of
//! the fetched item's modification timestamp. The comparison is exact
//! string equality, not a semantic time comparison.

use crate::models::ContentItem;

/// Outcome of the version gate for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Content changed (or never indexed); ingest with the new marker
    Ingest { marker: String },

    /// Unchanged since the stored marker; keep the indexed copy
    Retain,

    /// Content withdrawn or unreadable; remove from the index
    Delete,
}

/// Decide what to do with a freshly fetched item.
///
/// An item without available content is deleted regardless of the stored
/// marker. A document with no stored marker (first crawl) always ingests:
/// the comparison against an absent marker never matches.
pub fn decide(item: &ContentItem, stored_marker: Option<&str>) -> Decision {
    if !item.is_available() {
        return Decision::Delete;
    }

    let marker = item.record().version_marker();
    match (marker.as_deref(), stored_marker) {
        (Some(current), Some(stored)) if current == stored => Decision::Retain,
        _ => Decision::Ingest {
            marker: marker.clone().unwrap_or_default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;
    use serde_json::json;

    fn page(modified: Option<&str>, body: Option<&str>) -> ContentItem {
        let mut raw = json!({
            "id": "42",
            "type": "page",
            "title": "Release Notes",
            "space": { "key": "ENG" }
        });
        if let Some(when) = modified {
            raw["version"] = json!({ "when": when });
        }
        if let Some(body) = body {
            raw["body"] = json!({ "view": { "value": body } });
        }
        ContentItem::Page(Page::parse(&raw).unwrap())
    }

    #[test]
    fn test_unchanged_document_is_retained() {
        // Scenario: stored marker matches the fetched modification time.
        let item = page(Some("2020-01-01T00:00:00.000Z"), Some("<p>x</p>"));
        assert_eq!(
            decide(&item, Some("2020-01-01T00:00:00Z")),
            Decision::Retain
        );
    }

    #[test]
    fn test_changed_document_is_ingested() {
        let item = page(Some("2021-06-01T12:00:00.000Z"), Some("<p>x</p>"));
        assert_eq!(
            decide(&item, Some("2020-01-01T00:00:00Z")),
            Decision::Ingest {
                marker: "2021-06-01T12:00:00Z".to_string()
            }
        );
    }

    #[test]
    fn test_first_crawl_always_ingests() {
        let item = page(Some("2020-01-01T00:00:00.000Z"), Some("<p>x</p>"));
        assert!(matches!(decide(&item, None), Decision::Ingest { .. }));
    }

    #[test]
    fn test_missing_body_deletes_regardless_of_marker() {
        let item = page(Some("2020-01-01T00:00:00.000Z"), None);
        assert_eq!(decide(&item, Some("2020-01-01T00:00:00Z")), Decision::Delete);
        assert_eq!(decide(&item, None), Decision::Delete);

        let absent = ContentItem::Page(Page::absent("42"));
        assert_eq!(decide(&absent, Some("anything")), Decision::Delete);
    }

    #[test]
    fn test_missing_modification_time_ingests_with_empty_marker() {
        let item = page(None, Some("<p>x</p>"));
        assert_eq!(
            decide(&item, Some("2020-01-01T00:00:00Z")),
            Decision::Ingest {
                marker: String::new()
            }
        );
    }
}
