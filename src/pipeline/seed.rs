//! Seed enumeration.
//!
//! Walks the full paginated listing once per crawl cycle, emitting one
//! seed identifier per document. Every cycle re-lists from offset 0: the
//! remote offers no stable ordering or modification-time filter, so
//! resuming from a saved offset could silently skip documents deleted
//! ahead of the resume point. Duplicate emission across cycles is fine;
//! the version gate is idempotent.

use crate::pipeline::interruption::{ConnectorResult, classify_seeding};
use crate::services::ContentSource;

/// Listing page size used during seeding.
pub const SEED_PAGE_SIZE: usize = 50;

/// Receives seed identifiers as enumeration discovers them.
pub trait SeedSink {
    fn add_seed(&mut self, id: &str);
}

impl SeedSink for Vec<String> {
    fn add_seed(&mut self, id: &str) {
        self.push(id.to_string());
    }
}

/// Enumerate every document id visible through the listing.
///
/// Returns the new cycle marker, which is always empty: no delta state is
/// kept between cycles. A retryable failure fails the whole cycle; no
/// partial-resume state is persisted.
pub async fn enumerate_seeds(
    source: &dyn ContentSource,
    space: Option<&str>,
    sink: &mut dyn SeedSink,
) -> ConnectorResult<String> {
    let mut start = 0usize;
    log::debug!("Seeding from {start} with page size {SEED_PAGE_SIZE}");

    loop {
        let listing = source
            .list_pages(start, SEED_PAGE_SIZE, space)
            .await
            .map_err(classify_seeding)?;

        let count = listing.results.len();
        for summary in &listing.results {
            sink.add_seed(&summary.id);
        }
        log::debug!("Fetched and added {count} seed documents, new start {}", start + count);

        start += count;
        if listing.is_last {
            break;
        }
        if count == 0 {
            // An empty non-final page can never advance the offset.
            log::warn!("Listing returned an empty page before its end; stopping at {start}");
            break;
        }
    }

    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::interruption::ConnectorError;
    use crate::services::testing::{ScriptedSource, listing};

    #[tokio::test]
    async fn test_two_page_listing_emits_all_seeds_in_order() {
        // Scenario: page 1 carries a full 50 results, page 2 the final 3.
        let first: Vec<String> = (0..50).map(|i| format!("{i}")).collect();
        let first_refs: Vec<&str> = first.iter().map(String::as_str).collect();

        let source = ScriptedSource::with_listings(vec![
            listing(&first_refs, 0, false),
            listing(&["50", "51", "52"], 50, true),
        ]);

        let mut seeds: Vec<String> = Vec::new();
        let marker = enumerate_seeds(&source, None, &mut seeds).await.unwrap();

        assert_eq!(seeds.len(), 53);
        assert_eq!(seeds[0], "0");
        assert_eq!(seeds[49], "49");
        assert_eq!(seeds[52], "52");
        assert_eq!(marker, "");

        // The second request starts where the first page ended.
        assert_eq!(*source.listing_starts.lock().unwrap(), vec![0, 50]);
    }

    #[tokio::test]
    async fn test_last_page_results_are_still_emitted() {
        let source = ScriptedSource::with_listings(vec![listing(&["1", "2"], 0, true)]);

        let mut seeds: Vec<String> = Vec::new();
        enumerate_seeds(&source, None, &mut seeds).await.unwrap();

        assert_eq!(seeds, vec!["1", "2"]);
        assert_eq!(source.listing_starts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_restart_relists_from_zero() {
        let source = ScriptedSource::with_listings(vec![
            listing(&["1"], 0, true),
            listing(&["1"], 0, true),
        ]);

        let mut first: Vec<String> = Vec::new();
        enumerate_seeds(&source, None, &mut first).await.unwrap();
        let mut second: Vec<String> = Vec::new();
        enumerate_seeds(&source, None, &mut second).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(*source.listing_starts.lock().unwrap(), vec![0, 0]);
    }

    #[tokio::test]
    async fn test_listing_failure_classifies_as_retryable() {
        let mut source = ScriptedSource::with_listings(vec![listing(&["1"], 0, false)]);
        source.fail_listing_at = Some(1);

        let mut seeds: Vec<String> = Vec::new();
        let err = enumerate_seeds(&source, None, &mut seeds).await.unwrap_err();

        let ConnectorError::Retry(interruption) = err else {
            panic!("expected retryable classification");
        };
        assert!(interruption.unlimited());
        assert!(interruption.job_still_fresh);
    }

    #[tokio::test]
    async fn test_empty_non_final_page_stops() {
        let source = ScriptedSource::with_listings(vec![listing(&[], 0, false)]);

        let mut seeds: Vec<String> = Vec::new();
        enumerate_seeds(&source, None, &mut seeds).await.unwrap();

        assert!(seeds.is_empty());
        assert_eq!(source.listing_starts.lock().unwrap().len(), 1);
    }
}
