//! # Repository Module
//!
//! Database repository implementations for Fydo.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  BarcodeLookup (fydo-search)                                           │
//! │       │                                                                 │
//! │       │  db.products().get_by_code("3017620422003")                    │
//! │       ▼                                                                 │
//! │  ProductCacheRepository                                                │
//! │  ├── get_by_code / get_many                                            │
//! │  ├── upsert(record, fetched_at)                                        │
//! │  └── delete / prune_older_than / count                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductCacheRepository`](product::ProductCacheRepository) - Product cache reads and writes

pub mod product;
