//! # Quantity Module
//!
//! The single coercion boundary between loosely typed record fields and the
//! packaging rules.
//!
//! ## Why a Closed Sum Type?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE LOOSE INPUT PROBLEM                                                │
//! │                                                                         │
//! │  Supplier offers arrive as:                                            │
//! │    12        12.5       "12,5"      " 130 "     "n/a"    true    null   │
//! │                                                                         │
//! │  If every rule inspected raw values, every rule would need to know     │
//! │  about decimal commas, booleans and junk text.                         │
//! │                                                                         │
//! │  OUR SOLUTION: coerce once                                              │
//! │    FieldValue ──► Quantity::coerce ──► Valid(f64) | Absent             │
//! │                                                                         │
//! │  Valid always holds a finite number strictly greater than zero.        │
//! │  Zero, negatives, NaN, infinities, booleans and junk are Absent.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use offer_core::quantity::Quantity;
//! use offer_core::types::FieldValue;
//!
//! let q = Quantity::coerce(Some(&FieldValue::Text("12,5".to_string())));
//! assert_eq!(q.value(), Some(12.5));
//!
//! let zero = Quantity::coerce(Some(&FieldValue::Text("0".to_string())));
//! assert!(zero.is_absent());
//! ```

use std::fmt;

use crate::types::FieldValue;

/// Distance from an integer, in units of that integer's last bits, under
/// which a value is treated as that integer when rounding up.
///
/// `3.0 * (100.0 / 3.0)` evaluates to `100.00000000000001`; a plain ceiling
/// would report 101 pieces. The window is a few ULPs wide, so a genuine
/// fraction such as `20_000_000.01` still rounds up.
pub const INTEGER_TOLERANCE: f64 = 4.0 * f64::EPSILON;

// =============================================================================
// Quantity Type
// =============================================================================

/// A packaging or availability quantity after coercion.
///
/// ## Invariant
/// `Valid(v)` implies `v.is_finite() && v > 0.0`. The only constructors are
/// [`Quantity::coerce`] and [`Quantity::from_f64`], both of which enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Quantity {
    /// A finite, strictly positive number.
    Valid(f64),
    /// Missing, unparseable, zero, negative or non-finite.
    #[default]
    Absent,
}

impl Quantity {
    /// Coerces a raw record field.
    ///
    /// ## Rules
    /// - `None` → Absent
    /// - `Bool` → Absent (never 0/1)
    /// - `Integer` / `Number` → Valid if finite and > 0
    /// - `Text` → trimmed, decimal comma replaced by a point, then parsed
    pub fn coerce(value: Option<&FieldValue>) -> Self {
        match value.and_then(coerce_number) {
            Some(v) => Quantity::from_f64(v),
            None => Quantity::Absent,
        }
    }

    /// Wraps a computed value, rejecting anything that is not a finite
    /// positive number.
    #[inline]
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value > 0.0 {
            Quantity::Valid(value)
        } else {
            Quantity::Absent
        }
    }

    /// Returns the absent quantity.
    #[inline]
    pub const fn absent() -> Self {
        Quantity::Absent
    }

    /// Checks if the quantity holds a valid positive number.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Quantity::Valid(_))
    }

    /// Checks if the quantity is absent.
    #[inline]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Quantity::Absent)
    }

    /// Returns the inner number, if valid.
    #[inline]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Quantity::Valid(v) => Some(*v),
            Quantity::Absent => None,
        }
    }

    /// Rounds up to a whole count.
    ///
    /// Returns `None` when absent, or when the value is so close to zero that
    /// it rounds to nothing.
    ///
    /// ## Example
    /// ```rust
    /// use offer_core::quantity::Quantity;
    ///
    /// assert_eq!(Quantity::from_f64(10.83).ceil(), Some(11));
    /// assert_eq!(Quantity::from_f64(120.0).ceil(), Some(120));
    /// assert_eq!(Quantity::Absent.ceil(), None);
    /// ```
    pub fn ceil(&self) -> Option<u64> {
        let rounded = ceil_tolerant(self.value()?);
        if rounded >= 1.0 && rounded <= u64::MAX as f64 {
            Some(rounded as u64)
        } else {
            None
        }
    }

    /// Multiplies a valid quantity by two; absent stays absent.
    #[inline]
    pub fn doubled(self) -> Self {
        match self {
            Quantity::Valid(v) => Quantity::from_f64(v * 2.0),
            Quantity::Absent => Quantity::Absent,
        }
    }

    /// Keeps `self` if valid, otherwise evaluates `derive`.
    ///
    /// This is the authority rule in one place: a present value is never
    /// replaced by a derived one.
    #[inline]
    pub fn or_derive<F>(self, derive: F) -> Self
    where
        F: FnOnce() -> Quantity,
    {
        match self {
            Quantity::Valid(_) => self,
            Quantity::Absent => derive(),
        }
    }
}

impl From<Option<f64>> for Quantity {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Quantity::Absent, Quantity::from_f64)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Valid(v) => write!(f, "{}", v),
            Quantity::Absent => write!(f, "-"),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Converts a raw field to a finite number, without the positivity check.
///
/// Returns `None` for booleans, empty or unparseable text and non-finite
/// values. Zero and negatives come back as numbers; [`Quantity::from_f64`]
/// is what rejects them.
pub fn coerce_number(value: &FieldValue) -> Option<f64> {
    let number = match value {
        FieldValue::Bool(_) => return None,
        FieldValue::Integer(n) => *n as f64,
        FieldValue::Number(n) => *n,
        FieldValue::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.replace(',', ".").parse::<f64>().ok()?
        }
    };

    number.is_finite().then_some(number)
}

/// Ceiling that forgives floating noise around integers, never more.
///
/// ## Example
/// ```rust
/// use offer_core::quantity::ceil_tolerant;
///
/// assert_eq!(ceil_tolerant(10.2), 11.0);
/// assert_eq!(ceil_tolerant(3.0 * (100.0 / 3.0)), 100.0);
/// ```
pub fn ceil_tolerant(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() <= INTEGER_TOLERANCE * nearest.abs() {
        nearest
    } else {
        value.ceil()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
