//! # Search-and-Filter Pipeline
//!
//! Turns the upstream's unfiltered, paginated name search into a filtered
//! search that keeps paging until enough products pass the ingredient filter.
//!
//! ## Paging Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Search Invocation                                │
//! │                                                                         │
//! │  page = start_page, size = filter active ? 100 : page_size             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐                                              │
//! │  │ fetch page           │◄──────────────────────────────┐              │
//! │  └──────────┬───────────┘                               │              │
//! │             │ first page → remember server total        │              │
//! │             │ empty page → end of results, stop         │              │
//! │             ▼                                           │              │
//! │  ┌──────────────────────┐                               │              │
//! │  │ keep matches_all_    │                               │              │
//! │  │ filters() records    │                               │              │
//! │  └──────────┬───────────┘                               │              │
//! │             │ short page → end of results               │              │
//! │             ▼                                           │              │
//! │  matches < min_results && !end && pages < max_pages ────┘              │
//! │             │ otherwise                                                 │
//! │             ▼                                                           │
//! │  Success { matches } or FilteredEmpty                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pages are fetched one after another: each page's yield decides whether
//! another request is needed. The match list may overshoot `min_results` by
//! up to one page of matches. Any fetch error aborts the whole search.

use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use fydo_core::validation::{validate_search_options, validate_search_query};
use fydo_core::{
    matches_all_filters, IngredientFilter, ProductRecord, SearchOptions, SearchOutcome,
    SearchStatus, FILTERED_PAGE_SIZE,
};

use crate::client::ProductSource;
use crate::error::{SearchError, SearchResult};

/// Runs a name search, applying `filter` to every returned record.
///
/// Uses the fixed widened page size while the filter has any terms.
///
/// ## Errors
/// - `Validation` for an empty query or out-of-range options (no request made)
/// - `Timeout` / `Network` when a page fetch fails in transport
/// - anything else the source returns, unchanged
pub async fn search_by_name_with_filters<S>(
    source: &S,
    query: &str,
    filter: &IngredientFilter,
    options: SearchOptions,
) -> SearchResult<SearchOutcome>
where
    S: ProductSource + ?Sized,
{
    search_with_page_size(source, query, filter, options, FILTERED_PAGE_SIZE).await
}

/// Same as [`search_by_name_with_filters`] with an explicit page size for
/// filtered searches.
pub async fn search_with_page_size<S>(
    source: &S,
    query: &str,
    filter: &IngredientFilter,
    options: SearchOptions,
    filtered_page_size: u32,
) -> SearchResult<SearchOutcome>
where
    S: ProductSource + ?Sized,
{
    let query = validate_search_query(query)?;
    validate_search_options(&options)?;

    let filter_active = !filter.is_empty();
    let page_size = if filter_active {
        filtered_page_size
    } else {
        options.page_size
    };
    if page_size == 0 {
        return Err(SearchError::InvalidConfig(
            "filtered page size must be greater than 0".into(),
        ));
    }

    let search_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    debug!(
        search_id = %search_id,
        query = %query,
        filter_terms = filter.term_count(),
        page_size,
        min_results = options.min_results,
        max_pages = options.max_pages,
        "Starting product search"
    );

    let mut matches: Vec<ProductRecord> = Vec::new();
    let mut total_count = 0u64;
    let mut page = options.start_page;
    let mut pages_searched = 0u32;
    let mut end_of_results = false;

    loop {
        let fetched = source
            .search_page(&query, page, page_size)
            .await
            .map_err(|e| {
                warn!(search_id = %search_id, page, error = %e, "Search page fetch failed");
                e
            })?;

        pages_searched += 1;
        if pages_searched == 1 {
            total_count = fetched.count;
        }

        let fetched_len = fetched.products.len();
        if fetched_len == 0 {
            end_of_results = true;
            debug!(search_id = %search_id, page, "Empty page, end of results");
            break;
        }

        let before = matches.len();
        if filter_active {
            matches.extend(
                fetched
                    .products
                    .into_iter()
                    .filter(|record| matches_all_filters(record, filter)),
            );
        } else {
            matches.extend(fetched.products);
        }

        debug!(
            search_id = %search_id,
            page,
            fetched = fetched_len,
            kept = matches.len() - before,
            total_matches = matches.len(),
            "Processed search page"
        );

        if fetched_len < page_size as usize {
            end_of_results = true;
        }

        match page.checked_add(1) {
            Some(next) => page = next,
            None => end_of_results = true,
        }

        let enough = matches.len() >= options.min_results as usize;
        if enough || end_of_results || pages_searched >= options.max_pages {
            break;
        }
    }

    let status = if matches.is_empty() {
        SearchStatus::FilteredEmpty
    } else {
        SearchStatus::Success
    };
    let filtered_count = u32::try_from(matches.len()).unwrap_or(u32::MAX);
    let next_page = if end_of_results { None } else { Some(page) };

    info!(
        search_id = %search_id,
        query = %query,
        ?status,
        total_count,
        filtered_count,
        pages_searched,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Product search complete"
    );

    Ok(SearchOutcome {
        search_id,
        status,
        matches,
        total_count,
        filtered_count,
        pages_searched,
        next_page,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fydo_core::SearchPage;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    type PageFn = Box<dyn Fn(u32, u32) -> SearchResult<SearchPage> + Send + Sync>;

    /// In-memory source that records every (page, page_size) it is asked for.
    struct RecordingSource {
        pages: PageFn,
        requests: Mutex<Vec<(u32, u32)>>,
    }

    impl RecordingSource {
        fn new(pages: impl Fn(u32, u32) -> SearchResult<SearchPage> + Send + Sync + 'static) -> Self {
            RecordingSource {
                pages: Box::new(pages),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(u32, u32)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProductSource for RecordingSource {
        async fn search_page(&self, _query: &str, page: u32, page_size: u32) -> SearchResult<SearchPage> {
            self.requests.lock().unwrap().push((page, page_size));
            (self.pages)(page, page_size)
        }

        async fn fetch_product(&self, _code: &str) -> SearchResult<Option<ProductRecord>> {
            Ok(None)
        }
    }

    fn product(code: String, ingredients: &str) -> ProductRecord {
        ProductRecord::new(json!({ "code": code, "ingredients_text": ingredients }))
    }

    /// A full page where every record contains palm oil.
    fn palm_oil_page(page: u32, size: u32) -> SearchPage {
        SearchPage {
            count: 1000,
            products: (0..size)
                .map(|i| product(format!("{}-{}", page, i), "sucre, huile de palme"))
                .collect(),
        }
    }

    fn no_palm_oil() -> IngredientFilter {
        IngredientFilter::default().without_ingredient("huile de palme")
    }

    #[tokio::test]
    async fn test_no_matches_consults_exactly_max_pages() {
        let source = RecordingSource::new(|page, size| Ok(palm_oil_page(page, size)));
        let options = SearchOptions {
            min_results: 5,
            max_pages: 5,
            ..SearchOptions::default()
        };

        let outcome = search_by_name_with_filters(&source, "pâte à tartiner", &no_palm_oil(), options)
            .await
            .unwrap();

        assert_eq!(
            source.requests(),
            vec![(1, 100), (2, 100), (3, 100), (4, 100), (5, 100)]
        );
        assert_eq!(outcome.status, SearchStatus::FilteredEmpty);
        assert_eq!(outcome.filtered_count, 0);
        assert_eq!(outcome.total_count, 1000);
        assert_eq!(outcome.pages_searched, 5);
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.next_page, Some(6));
    }

    #[tokio::test]
    async fn test_enough_matches_on_first_page_stops() {
        let source = RecordingSource::new(|page, size| {
            Ok(SearchPage {
                count: 500,
                products: (0..size)
                    .map(|i| product(format!("{}-{}", page, i), "noisettes, cacao"))
                    .collect(),
            })
        });

        let outcome = search_by_name_with_filters(
            &source,
            "nutella",
            &no_palm_oil(),
            SearchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(source.requests(), vec![(1, 100)]);
        assert_eq!(outcome.status, SearchStatus::Success);
        assert_eq!(outcome.filtered_count, 100);
        assert_eq!(outcome.total_count, 500);
        assert_eq!(outcome.next_page, Some(2));
    }

    #[tokio::test]
    async fn test_short_first_page_stops_immediately() {
        let source = RecordingSource::new(|_, _| {
            Ok(SearchPage {
                count: 3,
                products: vec![
                    product("1".into(), "lait"),
                    product("2".into(), "huile de palme"),
                    product("3".into(), "sucre"),
                ],
            })
        });

        let outcome = search_by_name_with_filters(
            &source,
            "biscuit",
            &no_palm_oil(),
            SearchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(source.requests().len(), 1);
        assert_eq!(outcome.filtered_count, 2);
        assert_eq!(outcome.pages_searched, 1);
        assert_eq!(outcome.next_page, None);
    }

    #[tokio::test]
    async fn test_empty_page_ends_search() {
        let source = RecordingSource::new(|page, size| {
            if page == 1 {
                Ok(palm_oil_page(page, size))
            } else {
                Ok(SearchPage {
                    count: 1000,
                    products: Vec::new(),
                })
            }
        });

        let outcome = search_by_name_with_filters(
            &source,
            "nutella",
            &no_palm_oil(),
            SearchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(source.requests(), vec![(1, 100), (2, 100)]);
        assert_eq!(outcome.status, SearchStatus::FilteredEmpty);
        assert_eq!(outcome.pages_searched, 2);
        assert_eq!(outcome.next_page, None);
    }

    #[tokio::test]
    async fn test_unfiltered_search_uses_requested_page_size() {
        let source = RecordingSource::new(|page, size| Ok(palm_oil_page(page, size)));
        let options = SearchOptions {
            start_page: 3,
            page_size: 20,
            min_results: 30,
            max_pages: 5,
        };

        let outcome =
            search_by_name_with_filters(&source, "nutella", &IngredientFilter::default(), options)
                .await
                .unwrap();

        assert_eq!(source.requests(), vec![(3, 20), (4, 20)]);
        assert_eq!(outcome.filtered_count, 40);
        assert_eq!(outcome.status, SearchStatus::Success);
        assert_eq!(outcome.next_page, Some(5));
    }

    #[tokio::test]
    async fn test_matches_may_overshoot_min_results() {
        // Page 1 yields 3 matches, page 2 yields 4: the target of 5 is
        // crossed inside page 2 and all of page 2's matches are kept.
        let source = RecordingSource::new(|page, size| {
            let keep = if page == 1 { 3 } else { 4 };
            Ok(SearchPage {
                count: 1000,
                products: (0..size)
                    .map(|i| {
                        let text = if i < keep { "cacao" } else { "huile de palme" };
                        product(format!("{}-{}", page, i), text)
                    })
                    .collect(),
            })
        });
        let options = SearchOptions {
            min_results: 5,
            ..SearchOptions::default()
        };

        let outcome = search_by_name_with_filters(&source, "chocolat", &no_palm_oil(), options)
            .await
            .unwrap();

        assert_eq!(source.requests().len(), 2);
        assert_eq!(outcome.filtered_count, 7);
        assert_eq!(outcome.matches.len(), 7);
    }

    #[tokio::test]
    async fn test_fetch_error_aborts_search() {
        let source = RecordingSource::new(|page, size| {
            if page == 1 {
                Ok(palm_oil_page(page, size))
            } else {
                Err(SearchError::Timeout(Duration::from_secs(10)))
            }
        });

        let err = search_by_name_with_filters(
            &source,
            "nutella",
            &no_palm_oil(),
            SearchOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SearchError::Timeout(_)));
        assert!(err.is_retryable());
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_request() {
        let source = RecordingSource::new(|page, size| Ok(palm_oil_page(page, size)));

        let err = search_by_name_with_filters(
            &source,
            "   ",
            &IngredientFilter::default(),
            SearchOptions::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, SearchError::Validation(_)));
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_search_ids_are_unique() {
        let source = RecordingSource::new(|_, _| Ok(SearchPage::default()));
        let filter = IngredientFilter::default();

        let a = search_by_name_with_filters(&source, "a", &filter, SearchOptions::default())
            .await
            .unwrap();
        let b = search_by_name_with_filters(&source, "a", &filter, SearchOptions::default())
            .await
            .unwrap();

        assert_ne!(a.search_id, b.search_id);
        assert_eq!(a.status, SearchStatus::FilteredEmpty);
    }

    #[tokio::test]
    async fn test_last_page_number_is_searchable() {
        let source = RecordingSource::new(|page, size| Ok(palm_oil_page(page, size)));
        let options = SearchOptions {
            start_page: u32::MAX - 1,
            max_pages: 1,
            ..SearchOptions::default()
        };

        let outcome = search_by_name_with_filters(&source, "nutella", &no_palm_oil(), options)
            .await
            .unwrap();

        assert_eq!(source.requests(), vec![(u32::MAX - 1, 100)]);
        assert_eq!(outcome.pages_searched, 1);
        assert_eq!(outcome.next_page, Some(u32::MAX));
    }

    #[tokio::test]
    async fn test_start_page_past_u32_range_makes_no_request() {
        let source = RecordingSource::new(|page, size| Ok(palm_oil_page(page, size)));
        let options = SearchOptions {
            start_page: u32::MAX,
            max_pages: 1,
            ..SearchOptions::default()
        };

        let err = search_by_name_with_filters(&source, "nutella", &no_palm_oil(), options)
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::Validation(_)));
        assert!(source.requests().is_empty());
    }
}
