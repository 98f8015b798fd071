//! # OpenFoodFacts Client
//!
//! HTTP access to the two upstream endpoints the pipeline needs.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    OpenFoodFacts Endpoints                              │
//! │                                                                         │
//! │  Product Search                                                        │
//! │  GET {base}/cgi/search.pl?search_terms=nutella&search_simple=1         │
//! │      &action=process&json=1&page=1&page_size=20                        │
//! │  → { "count": 1234 | "1234", "products": [ {...}, ... ] }              │
//! │                                                                         │
//! │  Product Detail                                                        │
//! │  GET {base}/api/v0/product/3017620422003.json                          │
//! │  → { "status": 1, "code": "...", "product": {...} }                    │
//! │  → { "status": 0, "status_verbose": "product not found" }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pipeline and the barcode lookup only see the [`ProductSource`] trait,
//! so tests swap the network for an in-memory source.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;
use url::Url;

use fydo_core::{ProductRecord, SearchPage};

use crate::config::ApiSettings;
use crate::error::{SearchError, SearchResult};

// =============================================================================
// Product Source Trait
// =============================================================================

/// Anything that can answer product searches and code lookups.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Fetches one page of unfiltered search results.
    async fn search_page(&self, query: &str, page: u32, page_size: u32) -> SearchResult<SearchPage>;

    /// Fetches one product by code. `Ok(None)` means upstream does not know it.
    async fn fetch_product(&self, code: &str) -> SearchResult<Option<ProductRecord>>;
}

// =============================================================================
// HTTP Client
// =============================================================================

/// reqwest-backed [`ProductSource`] talking to an OpenFoodFacts instance.
#[derive(Debug, Clone)]
pub struct OpenFoodFactsClient {
    http: Client,
    base_url: Url,
    timeout: Duration,
}

impl OpenFoodFactsClient {
    /// Builds a client from API settings.
    ///
    /// ## Errors
    /// - `InvalidUrl` if `base_url` does not parse
    /// - `InvalidConfig` if the HTTP client cannot be built
    pub fn new(settings: &ApiSettings) -> SearchResult<Self> {
        let mut base_url = Url::parse(&settings.base_url)?;

        // Url::join replaces the last path segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let timeout = settings.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(settings.user_agent.as_str())
            .gzip(true)
            .build()
            .map_err(|e| SearchError::InvalidConfig(format!("HTTP client: {}", e)))?;

        Ok(OpenFoodFactsClient {
            http,
            base_url,
            timeout,
        })
    }

    /// Base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of one search page.
    pub fn search_url(&self, query: &str, page: u32, page_size: u32) -> SearchResult<Url> {
        let mut url = self.base_url.join("cgi/search.pl")?;
        url.query_pairs_mut()
            .append_pair("search_terms", query)
            .append_pair("search_simple", "1")
            .append_pair("action", "process")
            .append_pair("json", "1")
            .append_pair("page", &page.to_string())
            .append_pair("page_size", &page_size.to_string());
        Ok(url)
    }

    /// URL of one product detail document.
    pub fn product_url(&self, code: &str) -> SearchResult<Url> {
        Ok(self
            .base_url
            .join(&format!("api/v0/product/{}.json", code))?)
    }

    /// GETs `url` and decodes the body as JSON.
    ///
    /// Returns `Ok(None)` for a 404 so the detail endpoint can report
    /// not-found without an error.
    async fn get_json(&self, url: Url) -> SearchResult<Option<Value>> {
        let started = Instant::now();

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SearchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        debug!(
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(SearchError::UpstreamStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchError::from_reqwest(e, self.timeout))?;

        Ok(Some(body))
    }
}

#[async_trait]
impl ProductSource for OpenFoodFactsClient {
    async fn search_page(&self, query: &str, page: u32, page_size: u32) -> SearchResult<SearchPage> {
        let url = self.search_url(query, page, page_size)?;
        debug!(query = %query, page, page_size, "Fetching search page");

        match self.get_json(url.clone()).await? {
            Some(body) => parse_search_response(body),
            None => Err(SearchError::UpstreamStatus {
                status: StatusCode::NOT_FOUND.as_u16(),
                url: url.to_string(),
            }),
        }
    }

    async fn fetch_product(&self, code: &str) -> SearchResult<Option<ProductRecord>> {
        let url = self.product_url(code)?;
        debug!(code = %code, "Fetching product detail");

        match self.get_json(url).await? {
            Some(body) => parse_product_response(code, body),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Response Parsing
// =============================================================================

/// Reads a count that may arrive as a number or a numeric string.
fn lenient_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Decodes a search endpoint body into a [`SearchPage`].
///
/// A missing `products` array is an empty page. Anything other than a JSON
/// object is a decode error.
pub fn parse_search_response(body: Value) -> SearchResult<SearchPage> {
    let Value::Object(mut map) = body else {
        return Err(SearchError::Decode(
            "search response is not a JSON object".into(),
        ));
    };

    let count = lenient_count(map.get("count"));

    let products = match map.remove("products") {
        Some(Value::Array(items)) => items.into_iter().map(ProductRecord::new).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            return Err(SearchError::Decode(format!(
                "expected products array, got {}",
                other
            )))
        }
    };

    Ok(SearchPage { count, products })
}

/// Decodes a detail endpoint body.
///
/// `status` 0 (or a missing `product`) means not found. When the product
/// object carries no `code`, the requested code is filled in so the record
/// can be cached.
pub fn parse_product_response(code: &str, body: Value) -> SearchResult<Option<ProductRecord>> {
    let Value::Object(mut map) = body else {
        return Err(SearchError::Decode(
            "product response is not a JSON object".into(),
        ));
    };

    if lenient_count(map.get("status")) == 0 {
        return Ok(None);
    }

    match map.remove("product") {
        Some(Value::Object(mut product)) => {
            let has_code = product
                .get("code")
                .map(|c| !c.is_null() && c.as_str() != Some(""))
                .unwrap_or(false);
            if !has_code {
                let top_level = map
                    .get("code")
                    .and_then(Value::as_str)
                    .unwrap_or(code)
                    .to_string();
                product.insert("code".to_string(), Value::String(top_level));
            }
            Ok(Some(ProductRecord::new(Value::Object(product))))
        }
        Some(Value::Null) | None => Ok(None),
        Some(other) => Err(SearchError::Decode(format!(
            "expected product object, got {}",
            other
        ))),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
