//! # fydo-search: Product Search and Lookup for Fydo
//!
//! Finds food products on OpenFoodFacts by name (with ingredient include /
//! exclude filters) or by barcode (through the local cache).
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         fydo-search                                     │
//! │                                                                         │
//! │  Caller (CLI, web handler)                                             │
//! │       │                                 │                               │
//! │       │ name + IngredientFilter         │ barcode                       │
//! │       ▼                                 ▼                               │
//! │  ┌──────────────────────┐        ┌──────────────────────┐              │
//! │  │ pipeline             │        │ lookup               │              │
//! │  │ search_by_name_with_ │        │ BarcodeLookup        │──► fydo-db   │
//! │  │ filters()            │        │ (cache first)        │    cache     │
//! │  └──────────┬───────────┘        └──────────┬───────────┘              │
//! │             │                               │                           │
//! │             └──────────────┬────────────────┘                           │
//! │                            ▼                                            │
//! │                 ┌──────────────────────┐                               │
//! │                 │ client               │                               │
//! │                 │ ProductSource trait  │──► OpenFoodFacts (HTTPS)      │
//! │                 │ OpenFoodFactsClient  │                               │
//! │                 └──────────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - Upstream HTTP client and the `ProductSource` seam
//! - [`pipeline`] - Multi-page filtered name search
//! - [`lookup`] - Cache-first barcode lookup
//! - [`config`] - Layered configuration (defaults, TOML, environment)
//! - [`error`] - Search error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fydo_core::{IngredientFilter, SearchOptions};
//! use fydo_search::{search_by_name_with_filters, FydoConfig, OpenFoodFactsClient};
//!
//! let config = FydoConfig::load(None)?;
//! let client = OpenFoodFactsClient::new(&config.api)?;
//! let filter = IngredientFilter::default().without_ingredient("huile de palme");
//!
//! let outcome = search_by_name_with_filters(&client, "pâte à tartiner", &filter, SearchOptions::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod pipeline;

// =============================================================================
// Re-exports
// =============================================================================

pub use client::{OpenFoodFactsClient, ProductSource};
pub use config::FydoConfig;
pub use error::{SearchError, SearchResult};
pub use lookup::{BarcodeLookup, ProductCache};
pub use pipeline::{search_by_name_with_filters, search_with_page_size};
