//! # Article Number Module
//!
//! Formatting rules for internal article numbers like `AC00001000`.
//!
//! ## Shape
//! ```text
//! ┌────────┬──────────────────────┐
//! │ prefix │ zero-padded counter  │
//! │  "AC"  │     "00001000"       │
//! └────────┴──────────────────────┘
//!            width = 8 (minimum; larger counters simply grow)
//! ```
//!
//! Persisting the counter lives in `offer-store`. This module only turns
//! integers into strings and back.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::validation::{validate_article_prefix, validate_article_width, ValidationResult};

/// Default article number prefix.
pub const DEFAULT_PREFIX: &str = "AC";

/// Default zero-padded width of the counter.
pub const DEFAULT_WIDTH: usize = 8;

/// Counter value used when no state exists yet.
pub const DEFAULT_START_NEXT: u64 = 1000;

/// How article numbers are formatted and where a fresh counter starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ArticleNumberConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_width")]
    pub width: usize,

    /// First number handed out when the state file does not exist.
    #[serde(default = "default_start_next")]
    pub start_next: u64,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_width() -> usize {
    DEFAULT_WIDTH
}

fn default_start_next() -> u64 {
    DEFAULT_START_NEXT
}

impl Default for ArticleNumberConfig {
    fn default() -> Self {
        ArticleNumberConfig {
            prefix: default_prefix(),
            width: default_width(),
            start_next: default_start_next(),
        }
    }
}

/// Checks prefix and width.
pub fn validate_article_config(config: &ArticleNumberConfig) -> ValidationResult<()> {
    validate_article_prefix(&config.prefix)?;
    validate_article_width(config.width)?;
    Ok(())
}

/// Formats a counter value.
///
/// ## Example
/// ```rust
/// use offer_core::article::{format_article_number, ArticleNumberConfig};
///
/// let config = ArticleNumberConfig::default();
/// assert_eq!(format_article_number(1000, &config), "AC00001000");
/// ```
pub fn format_article_number(n: u64, config: &ArticleNumberConfig) -> String {
    format!("{}{:0width$}", config.prefix, n, width = config.width)
}

/// Parses an article number back into its counter value.
///
/// Accepts any number of digits at or above the configured width, since
/// counters that outgrow the width are formatted wider.
pub fn parse_article_number(value: &str, config: &ArticleNumberConfig) -> CoreResult<u64> {
    let invalid = |reason: String| CoreError::InvalidArticleNumber {
        value: value.to_string(),
        reason,
    };

    let digits = value
        .strip_prefix(config.prefix.as_str())
        .ok_or_else(|| invalid(format!("expected prefix '{}'", config.prefix)))?;

    if digits.len() < config.width {
        return Err(invalid(format!("expected at least {} digits", config.width)));
    }

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("counter must contain only digits".to_string()));
    }

    digits
        .parse::<u64>()
        .map_err(|e| invalid(format!("counter out of range: {}", e)))
}
