//! # Domain Types
//!
//! Core domain types used throughout Fydo.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ProductRecord   │   │IngredientFilter │   │ SearchOutcome   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  raw JSON bag   │   │  with [...]     │   │  status         │       │
//! │  │  code, name,    │   │  without [...]  │   │  matches        │       │
//! │  │  tags, texts    │   │                 │   │  total_count    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ProductSummary  │   │ CachedProduct   │   │ LookupOutcome   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  display cols   │   │  record         │   │  Cached         │       │
//! │  │  grades, nova   │   │  last_fetched_at│   │  Fetched, Stale │       │
//! │  └─────────────────┘   └─────────────────┘   │  NotFound       │       │
//! │                                               └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Loosely-Typed Records
//! OpenFoodFacts records have no fixed schema: any field may be missing,
//! `null`, a string where a list was expected, or a number where a string
//! was expected. [`ProductRecord`] keeps the raw JSON and every accessor
//! degrades to "absent" instead of failing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::filter::normalize_term;
use crate::{DEFAULT_MAX_PAGES, DEFAULT_MIN_RESULTS, DEFAULT_PAGE_SIZE};

// =============================================================================
// Product Record
// =============================================================================

/// A product as returned by the upstream API or loaded from the cache.
///
/// Never mutated by the search pipeline, only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct ProductRecord(#[ts(type = "Record<string, unknown>")] Value);

impl ProductRecord {
    /// Wraps a raw JSON value.
    pub fn new(raw: Value) -> Self {
        ProductRecord(raw)
    }

    /// Returns the underlying JSON.
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Consumes the record and returns the underlying JSON.
    pub fn into_json(self) -> Value {
        self.0
    }

    /// Returns the product code (barcode), if present.
    ///
    /// Some upstream records carry the code as a number, so both shapes are
    /// accepted.
    pub fn code(&self) -> Option<String> {
        match self.0.get("code") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Returns a non-empty text attribute.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Returns a list attribute as strings.
    ///
    /// Arrays yield their string elements; a plain string is split on commas.
    /// Anything else yields an empty list.
    pub fn tags(&self, key: &str) -> Vec<&str> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Display name, falling back through the localized variants.
    pub fn name(&self) -> Option<&str> {
        ["product_name", "product_name_fr", "product_name_en", "generic_name"]
            .iter()
            .find_map(|key| self.text(key))
    }

    /// Brand text (OpenFoodFacts stores a comma-separated list).
    pub fn brand(&self) -> Option<&str> {
        self.text("brands")
    }

    /// NOVA processing group (1-4). Accepts numbers and numeric strings.
    pub fn nova_group(&self) -> Option<i64> {
        match self.0.get("nova_group") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Extracts the normalized display columns.
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            code: self.code(),
            name: self.name().map(str::to_string),
            brand: self.brand().map(str::to_string),
            image_url: self
                .text("image_front_url")
                .or_else(|| self.text("image_url"))
                .map(str::to_string),
            nutriscore_grade: self.text("nutriscore_grade").map(str::to_lowercase),
            ecoscore_grade: self.text("ecoscore_grade").map(str::to_lowercase),
            nova_group: self.nova_group(),
            quantity: self.text("quantity").map(str::to_string),
            ingredients_text: self
                .text("ingredients_text")
                .or_else(|| self.text("ingredients_text_fr"))
                .or_else(|| self.text("ingredients_text_en"))
                .map(str::to_string),
            allergens: self
                .tags("allergens_tags")
                .into_iter()
                .map(normalize_term)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl From<Value> for ProductRecord {
    fn from(raw: Value) -> Self {
        ProductRecord(raw)
    }
}

// =============================================================================
// Product Summary
// =============================================================================

/// Normalized display columns extracted from a [`ProductRecord`].
///
/// These are also the typed columns of the cache table; the raw record is
/// stored beside them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub code: Option<String>,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// Nutri-Score grade, `a` to `e`.
    pub nutriscore_grade: Option<String>,
    /// Eco-Score grade, `a` to `e`.
    pub ecoscore_grade: Option<String>,
    /// NOVA group, 1 to 4.
    pub nova_group: Option<i64>,
    pub quantity: Option<String>,
    pub ingredients_text: Option<String>,
    /// Allergen tags with the namespace prefix stripped.
    pub allergens: Vec<String>,
}

// =============================================================================
// Ingredient Filter
// =============================================================================

/// Include/exclude ingredient constraints for a name search.
///
/// ## Entry Rules
/// - Terms are normalized (lower case, `en:`/`fr:` stripped, trimmed)
/// - Empty terms are dropped
/// - Duplicates are ignored
/// - Adding a term to one list removes it from the other
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct IngredientFilter {
    /// Every term must be present in at least one searchable field.
    #[serde(default)]
    pub with_ingredients: Vec<String>,

    /// No term may be present in any searchable field.
    #[serde(default)]
    pub without_ingredients: Vec<String>,
}

impl IngredientFilter {
    /// Builds a filter from raw user input, applying the entry rules.
    pub fn new<I, J, S, T>(with: I, without: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut filter = IngredientFilter::default();
        for term in with {
            filter.add_with(term.as_ref());
        }
        for term in without {
            filter.add_without(term.as_ref());
        }
        filter
    }

    /// Builder-style [`add_with`](Self::add_with).
    pub fn with_ingredient(mut self, term: &str) -> Self {
        self.add_with(term);
        self
    }

    /// Builder-style [`add_without`](Self::add_without).
    pub fn without_ingredient(mut self, term: &str) -> Self {
        self.add_without(term);
        self
    }

    /// Adds a must-be-present term. Returns false if nothing changed.
    pub fn add_with(&mut self, term: &str) -> bool {
        let term = normalize_term(term);
        if term.is_empty() || self.with_ingredients.contains(&term) {
            return false;
        }
        self.without_ingredients.retain(|t| t != &term);
        self.with_ingredients.push(term);
        true
    }

    /// Adds a must-be-absent term. Returns false if nothing changed.
    pub fn add_without(&mut self, term: &str) -> bool {
        let term = normalize_term(term);
        if term.is_empty() || self.without_ingredients.contains(&term) {
            return false;
        }
        self.with_ingredients.retain(|t| t != &term);
        self.without_ingredients.push(term);
        true
    }

    /// Removes a must-be-present term. Returns true if it was present.
    pub fn remove_with(&mut self, term: &str) -> bool {
        let term = normalize_term(term);
        let before = self.with_ingredients.len();
        self.with_ingredients.retain(|t| t != &term);
        before != self.with_ingredients.len()
    }

    /// Removes a must-be-absent term. Returns true if it was present.
    pub fn remove_without(&mut self, term: &str) -> bool {
        let term = normalize_term(term);
        let before = self.without_ingredients.len();
        self.without_ingredients.retain(|t| t != &term);
        before != self.without_ingredients.len()
    }

    /// True when neither list has a term.
    pub fn is_empty(&self) -> bool {
        self.with_ingredients.is_empty() && self.without_ingredients.is_empty()
    }

    /// Total number of terms across both lists.
    pub fn term_count(&self) -> usize {
        self.with_ingredients.len() + self.without_ingredients.len()
    }
}

// =============================================================================
// Search Options
// =============================================================================

/// Pagination bounds for one name search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// First upstream page to request (1-based).
    pub start_page: u32,

    /// Page size used when no filter is active.
    pub page_size: u32,

    /// Stop once at least this many matches are accumulated.
    pub min_results: u32,

    /// Ceiling on upstream requests for one search.
    pub max_pages: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            start_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            min_results: DEFAULT_MIN_RESULTS,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

// =============================================================================
// Search Page (raw upstream response)
// =============================================================================

/// One page of raw, unfiltered results from the search endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Total number of unfiltered matches reported by the server.
    pub count: u64,

    /// Records on this page.
    pub products: Vec<ProductRecord>,
}

// =============================================================================
// Search Outcome
// =============================================================================

/// How a name search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStatus {
    /// At least one record matched.
    Success,
    /// The server had results but none survived the filter.
    FilteredEmpty,
}

/// Result of a name search.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    /// Correlation id for this invocation (also present in log events).
    pub search_id: String,

    pub status: SearchStatus,

    /// Accumulated matches, in upstream order.
    pub matches: Vec<ProductRecord>,

    /// Unfiltered total reported by the server on the first page.
    pub total_count: u64,

    /// Number of matches (`matches.len()`).
    pub filtered_count: u32,

    /// Upstream pages consulted.
    pub pages_searched: u32,

    /// Page to resume from for "load more", `None` at end of results.
    pub next_page: Option<u32>,
}

impl SearchOutcome {
    /// True when the search ended with matches.
    pub fn is_success(&self) -> bool {
        self.status == SearchStatus::Success
    }
}

// =============================================================================
// Cached Product
// =============================================================================

/// A record loaded from the local cache with its fetch timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CachedProduct {
    pub record: ProductRecord,
    #[ts(as = "String")]
    pub last_fetched_at: DateTime<Utc>,
}

impl CachedProduct {
    /// How long ago the record was fetched from upstream.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_fetched_at
    }

    /// True if the record was fetched within `window` of `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) < window
    }
}

// =============================================================================
// Lookup Outcome
// =============================================================================

/// Result of a barcode lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum LookupOutcome {
    /// Served from the cache inside the freshness window.
    Cached { product: ProductRecord },

    /// Fetched from upstream and written to the cache.
    Fetched { product: ProductRecord },

    /// Upstream failed; an out-of-date cached copy was served instead.
    Stale {
        product: ProductRecord,
        #[ts(as = "String")]
        #[serde(rename = "lastFetchedAt")]
        last_fetched_at: DateTime<Utc>,
    },

    /// Upstream has no product with this code.
    NotFound { code: String },
}

impl LookupOutcome {
    /// Returns the product, if one was found.
    pub fn product(&self) -> Option<&ProductRecord> {
        match self {
            LookupOutcome::Cached { product }
            | LookupOutcome::Fetched { product }
            | LookupOutcome::Stale { product, .. } => Some(product),
            LookupOutcome::NotFound { .. } => None,
        }
    }

    /// True unless the outcome is `NotFound`.
    pub fn is_found(&self) -> bool {
        !matches!(self, LookupOutcome::NotFound { .. })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
