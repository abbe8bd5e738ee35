//! # Error Types
//!
//! Domain-specific error types for shopdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopdesk-core errors (this file)                                      │
//! │  ├── CoreError        - Domain errors (stock, missing references)      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopdesk-db errors (separate crate)                                   │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - HTTP status + detail message                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `Display` text of each variant is exactly what the HTTP caller reads
//! in the `detail` field, so messages are phrased for the API consumer.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item references a product that does not exist.
    #[error("Item {0} not found")]
    ProductNotFound(i64),

    /// Not enough stock to accept a line item.
    ///
    /// ## User Workflow
    /// ```text
    /// Place order (qty: 5)
    ///      │
    ///      ▼
    /// Guarded decrement: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Coffee", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Whole order rolled back, caller sees "Not enough Coffee in stock"
    /// ```
    #[error("Not enough {product} in stock")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The order references a client that does not exist.
    #[error("Client {0} not found")]
    ClientNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements and are
/// raised before anything touches the database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed email, malformed number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// CPF is not 11 digits, or all 11 digits are the same.
    #[error("Invalid CPF")]
    InvalidCpf,

    /// Product price below one major unit.
    #[error("Insert a valid price")]
    InvalidPrice,

    /// Product stock below one.
    #[error("Insert a valid quantity")]
    InvalidQuantity,

    /// Expiration date already in the past.
    #[error("Insert a valid date")]
    InvalidExpiration,

    /// Expiration date could not be parsed.
    #[error("The date must be in the format dd/mm/yyyy")]
    InvalidDateFormat,

    /// Order submitted without line items.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// A line total or the order total does not fit in i64 cents.
    #[error("Order total is too large")]
    TotalTooLarge,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
