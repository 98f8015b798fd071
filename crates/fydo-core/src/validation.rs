//! # Validation Module
//!
//! Input validation for searches and lookups.
//!
//! Everything here runs before any network call, so a bad query never costs
//! an upstream request.
//!
//! ## Usage
//! ```rust
//! use fydo_core::validation::{validate_search_query, validate_barcode};
//!
//! assert_eq!(validate_search_query("  nutella ").unwrap(), "nutella");
//! assert!(validate_search_query("   ").is_err());
//!
//! assert!(validate_barcode("3017620422003").is_ok());
//! assert!(validate_barcode("30176-20422").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::SearchOptions;
use crate::{MAX_BARCODE_LENGTH, MAX_PAGES_CEILING, MAX_PAGE_SIZE, MAX_QUERY_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product-name search query.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Maximum 200 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.is_empty() {
        return Err(ValidationError::required("query"));
    }

    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LENGTH,
        });
    }

    Ok(query.to_string())
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Digits only
/// - At most 14 digits (GTIN-14)
///
/// ## Returns
/// The trimmed code.
pub fn validate_barcode(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("code"));
    }

    if !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    if code.len() > MAX_BARCODE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_BARCODE_LENGTH,
        });
    }

    Ok(code.to_string())
}

/// Checks if a query looks like a barcode (8-14 numeric digits).
///
/// ## Barcode Formats Detected
/// - EAN-8: 8 digits
/// - UPC-A: 12 digits
/// - EAN-13: 13 digits
/// - GTIN-14: 14 digits
pub fn is_barcode_query(query: &str) -> bool {
    let query = query.trim();
    (8..=MAX_BARCODE_LENGTH).contains(&query.len()) && query.chars().all(|c| c.is_ascii_digit())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates pagination bounds.
///
/// ## Rules
/// - `start_page` >= 1
/// - `page_size` in 1..=1000
/// - `max_pages` in 1..=50
/// - `start_page + max_pages` fits in a `u32`, so every page number the
///   search can request (and the next-page cursor) is representable
pub fn validate_search_options(options: &SearchOptions) -> ValidationResult<()> {
    if options.start_page == 0 {
        return Err(ValidationError::OutOfRange {
            field: "start_page".to_string(),
            min: 1,
            max: i64::from(u32::MAX),
        });
    }

    if options.page_size == 0 || options.page_size > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }

    if options.max_pages == 0 || options.max_pages > MAX_PAGES_CEILING {
        return Err(ValidationError::OutOfRange {
            field: "max_pages".to_string(),
            min: 1,
            max: i64::from(MAX_PAGES_CEILING),
        });
    }

    if options.start_page.checked_add(options.max_pages).is_none() {
        return Err(ValidationError::OutOfRange {
            field: "start_page".to_string(),
            min: 1,
            max: i64::from(u32::MAX - options.max_pages),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
