//! # fydo-core: Pure Product Logic for Fydo
//!
//! This crate holds the product types and the ingredient filter predicate as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Fydo Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Front ends (web app, `fydo` CLI)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        fydo-search (OpenFoodFacts client, pipeline, lookup)     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ fydo-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │  filter   │  │ validation│                  │   │
//! │  │   │ Product   │  │ normalize │  │  query    │                  │   │
//! │  │   │ Filter    │  │ match     │  │  barcode  │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    fydo-db (Product cache)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ProductRecord, IngredientFilter, outcomes)
//! - [`filter`] - Ingredient include/exclude predicate
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use fydo_core::{matches_all_filters, IngredientFilter, ProductRecord};
//! use serde_json::json;
//!
//! let record = ProductRecord::new(json!({
//!     "code": "3017620422003",
//!     "ingredients_text": "Sucre, huile de palme, noisettes 13%, lait écrémé en poudre",
//! }));
//!
//! let filter = IngredientFilter::default().without_ingredient("huile de palme");
//! assert!(!matches_all_filters(&record, &filter));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::ValidationError;
pub use filter::{matches_all_filters, normalize_term, term_matches_field};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Page size used for every fetch while an ingredient filter is active.
///
/// Filtering throws most of a page away, so pages are widened to keep the
/// number of upstream requests down.
pub const FILTERED_PAGE_SIZE: u32 = 100;

/// Default page size for unfiltered searches.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default minimum number of matches before a search stops paging.
pub const DEFAULT_MIN_RESULTS: u32 = 20;

/// Default ceiling on upstream pages per search.
pub const DEFAULT_MAX_PAGES: u32 = 5;

/// Cached records younger than this are served without a network call.
pub const CACHE_FRESHNESS_DAYS: i64 = 30;

/// Longest accepted freshness window or prune age, in days (100 years).
pub const MAX_FRESHNESS_DAYS: i64 = 36_500;

/// Longest accepted search query, in characters.
pub const MAX_QUERY_LENGTH: usize = 200;

/// Longest accepted product code (GTIN-14).
pub const MAX_BARCODE_LENGTH: usize = 14;

/// Largest page size the upstream API accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Hard upper bound for `max_pages`.
pub const MAX_PAGES_CEILING: u32 = 50;
