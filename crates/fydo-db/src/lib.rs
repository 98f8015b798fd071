//! # fydo-db: Product Cache for Fydo
//!
//! Local SQLite storage for product records fetched from OpenFoodFacts,
//! using sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Fydo Data Flow                                 │
//! │                                                                         │
//! │  BarcodeLookup::lookup(code)  (fydo-search)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     fydo-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────┐   ┌──────────────┐ │   │
//! │  │   │   Database    │    │   Repository     │   │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │◄───│  ProductCache    │   │  (embedded)  │ │   │
//! │  │   └───────────────┘    └──────────────────┘   └──────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/fydo/fydo.db (platform data dir)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fydo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("fydo.db")).await?;
//! let cached = db.products().get_by_code("3017620422003").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::product::ProductCacheRepository;
