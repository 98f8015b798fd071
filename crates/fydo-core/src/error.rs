//! # Error Types
//!
//! Domain-specific error types for fydo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  fydo-core errors (this file)                                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  fydo-db errors (separate crate)                                       │
//! │  └── DbError          - Cache operation failures                       │
//! │                                                                         │
//! │  fydo-search errors (separate crate)                                   │
//! │  └── SearchError      - What callers see (timeout, network, ...)       │
//! │                                                                         │
//! │  Flow: ValidationError → DbError / SearchError → Caller                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// They are raised before any network call is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., a barcode with letters in it).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}
