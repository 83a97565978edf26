//! # Error Types
//!
//! Domain-specific error types for offer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  offer-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Caller configuration / input failures          │
//! │                                                                         │
//! │  offer-store errors (separate crate)                                   │
//! │  └── StoreError       - Counter state file failures                    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ConfigError      - Config file / environment problems             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → anyhow → stderr      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! Malformed numeric values on a record (`"abc"`, `0`, `-3`) never produce
//! an error. They coerce to [`Quantity::Absent`](crate::quantity::Quantity)
//! and the affected relationship is simply left incomplete.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An article number string does not match the configured format.
    ///
    /// ## When This Occurs
    /// - Wrong prefix (`"XX00001000"` with prefix `AC`)
    /// - Non-digit characters after the prefix
    #[error("Invalid article number '{value}': {reason}")]
    InvalidArticleNumber { value: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These cover caller misuse (a bad iteration cap, a bad allocation count),
/// never the numeric content of a record.
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
