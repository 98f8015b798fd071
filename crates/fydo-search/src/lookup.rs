//! # Barcode Lookup
//!
//! Cache-first product lookup by code.
//!
//! ## Decision Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    lookup("3017620422003")                              │
//! │                                                                         │
//! │  cache.get(code)                                                       │
//! │       │                                                                 │
//! │       ├── fresh (age < window) ──────────────────────► Cached          │
//! │       │                                                                 │
//! │       ▼ missing or stale                                               │
//! │  source.fetch_product(code)                                            │
//! │       │                                                                 │
//! │       ├── Ok(Some) ── cache.put ─────────────────────► Fetched         │
//! │       ├── Ok(None) ──────────────────────────────────► NotFound        │
//! │       ├── Err, stale copy exists ────────────────────► Stale           │
//! │       └── Err, nothing cached ───────────────────────► Err             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cache that cannot be read or written never fails a lookup; the problem
//! is logged and the lookup carries on as if the cache were empty.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use fydo_core::validation::validate_barcode;
use fydo_core::{CachedProduct, LookupOutcome, ProductRecord, CACHE_FRESHNESS_DAYS};
use fydo_db::ProductCacheRepository;

use crate::client::ProductSource;
use crate::error::SearchResult;

// =============================================================================
// Cache Trait
// =============================================================================

/// Storage for previously fetched product records.
#[async_trait]
pub trait ProductCache: Send + Sync {
    /// Reads the cached copy of `code`, if any.
    async fn get(&self, code: &str) -> SearchResult<Option<CachedProduct>>;

    /// Stores `record` under `code` as fetched at `fetched_at`.
    ///
    /// `code` is the code that was looked up, which can differ from the
    /// record's own `code` field (UPC-A requests come back in EAN-13 form).
    async fn put(&self, code: &str, record: &ProductRecord, fetched_at: DateTime<Utc>) -> SearchResult<()>;
}

#[async_trait]
impl ProductCache for ProductCacheRepository {
    async fn get(&self, code: &str) -> SearchResult<Option<CachedProduct>> {
        Ok(self.get_by_code(code).await?)
    }

    async fn put(&self, code: &str, record: &ProductRecord, fetched_at: DateTime<Utc>) -> SearchResult<()> {
        Ok(self.upsert(code, record, fetched_at).await?)
    }
}

// =============================================================================
// Barcode Lookup
// =============================================================================

/// Looks products up by code, preferring the local cache.
pub struct BarcodeLookup<S, C> {
    source: S,
    cache: C,
    freshness: Duration,
}

impl<S, C> BarcodeLookup<S, C>
where
    S: ProductSource,
    C: ProductCache,
{
    /// Creates a lookup with the default 30-day freshness window.
    pub fn new(source: S, cache: C) -> Self {
        BarcodeLookup {
            source,
            cache,
            freshness: Duration::days(CACHE_FRESHNESS_DAYS),
        }
    }

    /// Overrides the freshness window.
    pub fn with_freshness(mut self, window: Duration) -> Self {
        self.freshness = window;
        self
    }

    /// Returns the freshness window.
    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Looks up `code` as of now.
    pub async fn lookup(&self, code: &str) -> SearchResult<LookupOutcome> {
        self.lookup_at(code, Utc::now()).await
    }

    /// Looks up `code`, judging cache freshness against `now`.
    ///
    /// ## Errors
    /// - `Validation` if `code` is not a barcode
    /// - the upstream error when the fetch fails and nothing is cached
    pub async fn lookup_at(&self, code: &str, now: DateTime<Utc>) -> SearchResult<LookupOutcome> {
        let code = validate_barcode(code)?;

        let cached = match self.cache.get(&code).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(code = %code, error = %e, "Cache read failed, going to upstream");
                None
            }
        };

        if let Some(ref entry) = cached {
            if entry.is_fresh(now, self.freshness) {
                debug!(
                    code = %code,
                    age_days = entry.age(now).num_days(),
                    "Serving product from cache"
                );
                return Ok(LookupOutcome::Cached {
                    product: entry.record.clone(),
                });
            }
            debug!(code = %code, age_days = entry.age(now).num_days(), "Cached copy is stale");
        }

        match self.source.fetch_product(&code).await {
            Ok(Some(product)) => {
                if let Some(upstream_code) = product.code().filter(|c| *c != code) {
                    debug!(code = %code, upstream_code = %upstream_code, "Upstream answered with another code form");
                }
                if let Err(e) = self.cache.put(&code, &product, now).await {
                    warn!(code = %code, error = %e, "Failed to cache fetched product");
                }
                info!(code = %code, "Fetched product from upstream");
                Ok(LookupOutcome::Fetched { product })
            }
            Ok(None) => {
                info!(code = %code, "Product not found upstream");
                Ok(LookupOutcome::NotFound { code })
            }
            Err(e) => match cached {
                Some(entry) => {
                    warn!(
                        code = %code,
                        error = %e,
                        last_fetched_at = %entry.last_fetched_at,
                        "Upstream failed, serving stale cached copy"
                    );
                    Ok(LookupOutcome::Stale {
                        product: entry.record,
                        last_fetched_at: entry.last_fetched_at,
                    })
                }
                None => Err(e),
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use fydo_core::SearchPage;
    use fydo_db::{Database, DbConfig};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CODE: &str = "3017620422003";

    enum Upstream {
        Found,
        Widened,
        Missing,
        Down,
    }

    struct CountingSource {
        upstream: Upstream,
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn new(upstream: Upstream) -> Self {
            CountingSource {
                upstream,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ProductSource for CountingSource {
        async fn search_page(&self, _query: &str, _page: u32, _page_size: u32) -> SearchResult<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn fetch_product(&self, code: &str) -> SearchResult<Option<ProductRecord>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.upstream {
                Upstream::Found => Ok(Some(ProductRecord::new(json!({
                    "code": code,
                    "product_name": "Nutella (fresh)",
                })))),
                Upstream::Widened => Ok(Some(ProductRecord::new(json!({
                    "code": format!("0{}", code),
                    "product_name": "Peanut Butter",
                })))),
                Upstream::Missing => Ok(None),
                Upstream::Down => Err(SearchError::Network("connection refused".into())),
            }
        }
    }

    fn cached_nutella() -> ProductRecord {
        ProductRecord::new(json!({ "code": CODE, "product_name": "Nutella (cached)" }))
    }

    async fn cache_with_entry(age_days: i64) -> ProductCacheRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.upsert(CODE, &cached_nutella(), Utc::now() - Duration::days(age_days))
            .await
            .unwrap();
        repo
    }

    async fn empty_cache() -> ProductCacheRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().products()
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_upstream() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Found), cache_with_entry(10).await);

        let outcome = lookup.lookup(CODE).await.unwrap();

        assert!(matches!(outcome, LookupOutcome::Cached { .. }));
        assert_eq!(outcome.product().unwrap().name(), Some("Nutella (cached)"));
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stale_cache_refetches_and_updates() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Found), cache_with_entry(40).await);

        let outcome = lookup.lookup(CODE).await.unwrap();

        assert!(matches!(outcome, LookupOutcome::Fetched { .. }));
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 1);

        let stored = lookup.cache.get_by_code(CODE).await.unwrap().unwrap();
        assert_eq!(stored.record.name(), Some("Nutella (fresh)"));
        assert!(stored.is_fresh(Utc::now(), Duration::days(30)));
    }

    #[tokio::test]
    async fn test_upstream_failure_serves_stale_copy() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Down), cache_with_entry(40).await);

        let outcome = lookup.lookup(CODE).await.unwrap();

        match outcome {
            LookupOutcome::Stale { product, .. } => {
                assert_eq!(product.name(), Some("Nutella (cached)"));
            }
            other => panic!("expected stale outcome, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_without_cache_propagates() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Down), empty_cache().await);

        let err = lookup.lookup(CODE).await.unwrap_err();
        assert!(matches!(err, SearchError::Network(_)));
    }

    #[tokio::test]
    async fn test_not_found_is_a_status() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Missing), empty_cache().await);

        let outcome = lookup.lookup("0000000000000").await.unwrap();
        assert_eq!(
            outcome,
            LookupOutcome::NotFound {
                code: "0000000000000".to_string()
            }
        );
        assert!(!outcome.is_found());
    }

    #[tokio::test]
    async fn test_freshness_window_is_configurable() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Found), cache_with_entry(10).await)
            .with_freshness(Duration::days(7));

        let outcome = lookup.lookup(CODE).await.unwrap();
        assert!(matches!(outcome, LookupOutcome::Fetched { .. }));
    }

    #[tokio::test]
    async fn test_invalid_code_is_rejected_before_any_call() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Found), empty_cache().await);

        let err = lookup.lookup("not-a-code").await.unwrap_err();
        assert!(matches!(err, SearchError::Validation(_)));
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upc_a_request_hits_cache_on_second_lookup() {
        let lookup = BarcodeLookup::new(CountingSource::new(Upstream::Widened), empty_cache().await);

        let first = lookup.lookup("012345678905").await.unwrap();
        assert!(matches!(first, LookupOutcome::Fetched { .. }));
        assert_eq!(first.product().unwrap().code().as_deref(), Some("0012345678905"));

        let second = lookup.lookup("012345678905").await.unwrap();
        assert!(matches!(second, LookupOutcome::Cached { .. }));
        assert_eq!(second.product().unwrap().name(), Some("Peanut Butter"));
        assert_eq!(lookup.source.calls.load(Ordering::SeqCst), 1);
    }
}
