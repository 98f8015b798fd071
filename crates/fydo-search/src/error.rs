//! # Search Error Types
//!
//! Error types for searches and barcode lookups.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Search Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Upstream            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Timeout        │  │  UpstreamStatus         │ │
//! │  │  InvalidUrl     │  │  Network        │  │  Decode                 │ │
//! │  │  ConfigLoad...  │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │   Validation    │  │     Cache       │                              │
//! │  │                 │  │                 │                              │
//! │  │  Validation     │  │  Cache          │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only `Timeout` and `Network` are worth offering the user a retry for.
//! Nothing in this crate retries on its own.

use std::time::Duration;

use fydo_core::ValidationError;
use fydo_db::DbError;
use thiserror::Error;

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search error type covering every way a search or lookup can fail.
#[derive(Debug, Error)]
pub enum SearchError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Query, barcode or paging options rejected before any request.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The upstream did not answer within the client timeout.
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// Connection could not be established or was dropped.
    #[error("Network error: {0}")]
    Network(String),

    // =========================================================================
    // Upstream Errors
    // =========================================================================
    /// Upstream answered with a non-success HTTP status.
    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { status: u16, url: String },

    /// Upstream body was not the JSON we expected.
    #[error("Failed to decode upstream response: {0}")]
    Decode(String),

    // =========================================================================
    // Cache Errors
    // =========================================================================
    /// Local cache failure.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for SearchError {
    fn from(err: DbError) -> Self {
        SearchError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for SearchError {
    fn from(err: url::ParseError) -> Self {
        SearchError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SearchError {
    fn from(err: std::io::Error) -> Self {
        SearchError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SearchError {
    fn from(err: toml::de::Error) -> Self {
        SearchError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SearchError {
    fn from(err: toml::ser::Error) -> Self {
        SearchError::ConfigSaveFailed(err.to_string())
    }
}

impl SearchError {
    /// Classifies a reqwest failure.
    ///
    /// ## Mapping
    /// ```text
    /// is_timeout()              → Timeout(timeout)
    /// is_connect() / is_request → Network
    /// is_decode()               → Decode
    /// is_status()               → UpstreamStatus
    /// other                     → Internal
    /// ```
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return SearchError::Timeout(timeout);
        }

        if err.is_connect() || err.is_request() {
            return SearchError::Network(err.to_string());
        }

        if err.is_decode() || err.is_body() {
            return SearchError::Decode(err.to_string());
        }

        if let Some(status) = err.status() {
            return SearchError::UpstreamStatus {
                status: status.as_u16(),
                url: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }

        SearchError::Internal(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SearchError {
    /// Returns true if a retry offered to the user might succeed.
    ///
    /// ## Retryable Errors
    /// - Timeouts
    /// - Network failures
    /// - Upstream 5xx answers
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Timeout(_) | SearchError::Network(_) => true,
            SearchError::UpstreamStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SearchError::InvalidConfig(_)
                | SearchError::InvalidUrl(_)
                | SearchError::ConfigLoadFailed(_)
                | SearchError::ConfigSaveFailed(_)
        )
    }

    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Timeout(_) => {
                "The product database is taking too long to answer. Please try again.".to_string()
            }
            SearchError::Network(_) => {
                "Could not reach the product database. Check your connection and try again."
                    .to_string()
            }
            SearchError::Validation(err) => err.to_string(),
            other => format!("Search failed: {}", other),
        }
    }
}
