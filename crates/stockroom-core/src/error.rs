//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors                                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  stockroom-service errors                                              │
//! │  └── ServiceError     - What callers see (auth, stock, storage)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError ← DbError            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced item does not exist or is no longer sellable.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Insufficient stock to complete a sale.
    ///
    /// `requested` is the total quantity asked for this item across every
    /// line of the sale, not the quantity of a single line.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale request: ITEM-A × 4, ITEM-A × 3
    ///      │
    ///      ▼
    /// Check stock: available=5, requested=7
    ///      │
    ///      ▼
    /// InsufficientStock { item_id: "ITEM-A", available: 5, requested: 7 }
    /// ```
    #[error("Insufficient stock for {item_id}: available {available}, requested {requested}")]
    InsufficientStock {
        item_id: String,
        available: i64,
        requested: i64,
    },

    /// Role string outside the closed set of roles.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Payment status string outside pending/paid/cancelled.
    #[error("Unknown payment status: {0}")]
    UnknownPaymentStatus(String),

    /// User management rule rejected the operation.
    #[error("{0}")]
    UserManagement(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at the boundary, before any storage work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Collection must not be empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// A computed amount left the representable range.
    #[error("{field} exceeds the largest supported amount")]
    Overflow { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
