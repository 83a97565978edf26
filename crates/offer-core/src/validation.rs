//! # Validation Module
//!
//! Checks on caller-supplied settings: the iteration cap, article number
//! formatting and allocation counts.
//!
//! ## What Gets Validated Where
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI / config file                                            │
//! │  ├── Type validation (clap, TOML deserialization)                      │
//! │  └── THIS MODULE: range and format rules                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Completion engine                                            │
//! │  └── Record values are NEVER validated, only coerced                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Article number store                                         │
//! │  └── State file contents checked on load                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use offer_core::validation::{validate_iteration_cap, validate_allocation_count};
//!
//! assert_eq!(validate_iteration_cap(3).unwrap(), 3);
//! assert!(validate_allocation_count(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_ARTICLE_DIGITS, MAX_ITERATION_CAP};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Engine Settings
// =============================================================================

/// Validates the fixpoint iteration cap.
///
/// ## Rules
/// - At least 1 (zero passes would return the input unchanged)
/// - At most [`MAX_ITERATION_CAP`]
///
/// Takes `i64` so that negative values from config files and the command
/// line are reported as out of range instead of failing to parse.
///
/// ## Example
/// ```rust
/// use offer_core::validation::validate_iteration_cap;
///
/// assert!(validate_iteration_cap(1).is_ok());
/// assert!(validate_iteration_cap(0).is_err());
/// assert!(validate_iteration_cap(-2).is_err());
/// ```
pub fn validate_iteration_cap(max_iterations: i64) -> ValidationResult<usize> {
    if !(1..=MAX_ITERATION_CAP as i64).contains(&max_iterations) {
        return Err(ValidationError::OutOfRange {
            field: "max_iterations".to_string(),
            min: 1,
            max: MAX_ITERATION_CAP as i64,
        });
    }

    Ok(max_iterations as usize)
}

// =============================================================================
// Article Numbers
// =============================================================================

/// Validates an article number prefix.
///
/// ## Rules
/// - Must not be empty
/// - At most 8 characters
/// - ASCII letters only, so the numeric part can always be split off
pub fn validate_article_prefix(prefix: &str) -> ValidationResult<()> {
    if prefix.is_empty() {
        return Err(ValidationError::Required {
            field: "prefix".to_string(),
        });
    }

    if prefix.len() > 8 {
        return Err(ValidationError::TooLong {
            field: "prefix".to_string(),
            max: 8,
        });
    }

    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "prefix".to_string(),
            reason: "must contain only ASCII letters".to_string(),
        });
    }

    Ok(())
}

/// Validates the zero-padded width of the numeric part.
///
/// Upper bound is the number of digits that always fits in a `u64`.
pub fn validate_article_width(width: usize) -> ValidationResult<()> {
    if !(1..=MAX_ARTICLE_DIGITS).contains(&width) {
        return Err(ValidationError::OutOfRange {
            field: "width".to_string(),
            min: 1,
            max: MAX_ARTICLE_DIGITS as i64,
        });
    }

    Ok(())
}

/// Validates how many article numbers a single call may hand out.
///
/// ## Example
/// ```rust
/// use offer_core::validation::validate_allocation_count;
///
/// assert!(validate_allocation_count(5).is_ok());
/// assert!(validate_allocation_count(0).is_err());
/// ```
pub fn validate_allocation_count(count: u64) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::MustBePositive {
            field: "count".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
