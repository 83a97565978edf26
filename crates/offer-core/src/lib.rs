//! # offer-core: Pure Business Logic for Offer Desk
//!
//! Completes supplier offer records: fills in the packaging hierarchy
//! (pieces per case, cases per pallet, pieces per pallet) and the three
//! availability figures (pieces, cartons, pallets) from whatever subset the
//! supplier provided.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Offer Desk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    offer-desk CLI                               │   │
//! │  │    complete ──► (assign article numbers) ──► JSON out          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ offer-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ quantity  │  │ packaging │  │  article  │  │   │
//! │  │   │  Offer-   │  │  coerce   │  │   triad   │  │  format   │  │   │
//! │  │   │  Record   │  │  Valid /  │  │  avail.   │  │  parse    │  │   │
//! │  │   │           │  │  Absent   │  │  fixpoint │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO LOGGING • NO SHARED STATE • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  offer-store (persistence)                      │   │
//! │  │            article number counter, locked + atomic              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Offer record and its loose field values
//! - [`quantity`] - Coercion of loose values into `Valid | Absent`
//! - [`packaging`] - The completion engine
//! - [`article`] - Article number formatting
//! - [`error`] - Domain error types
//! - [`validation`] - Checks on caller-supplied settings
//!
//! ## Design Principles
//!
//! 1. **Supplier data wins**: a present, valid value is never overwritten
//! 2. **Never invent**: a field is filled only when its inputs are known
//! 3. **Whole units out**: availability is a positive integer or absent
//! 4. **Junk is absent, not an error**: malformed numbers never fail a record
//!
//! ## Example Usage
//!
//! ```rust
//! use offer_core::{complete_record, CompletionOptions, FieldValue, OfferRecord, PackagingField};
//!
//! let record = OfferRecord::default()
//!     .with(PackagingField::PiecePerCase, 12u64)
//!     .with(PackagingField::CasePerPallet, 10u64);
//!
//! let done = complete_record(record, &CompletionOptions::default()).unwrap();
//! assert_eq!(done.record.pieces_per_pallet, Some(FieldValue::Integer(120)));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod article;
pub mod error;
pub mod packaging;
pub mod quantity;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use offer_core::OfferRecord` instead of
// `use offer_core::types::OfferRecord`

pub use article::ArticleNumberConfig;
pub use error::{CoreError, CoreResult, ValidationError};
pub use packaging::{complete_record, complete_records, Completion, CompletionOptions, CompletionReport};
pub use quantity::Quantity;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default number of {triad → availability} passes per record.
///
/// ## Business Reason
/// Every chain in the derivation graph settles within two passes; the third
/// confirms nothing changed.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// Largest accepted iteration cap.
pub const MAX_ITERATION_CAP: usize = 32;

/// Most counter digits that always fit in a `u64`.
pub const MAX_ARTICLE_DIGITS: usize = 18;
