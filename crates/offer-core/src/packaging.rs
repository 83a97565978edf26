//! # Packaging Module
//!
//! Completes the packaging triad and the three availability figures of an
//! offer record from whatever the supplier provided.
//!
//! ## Derivation Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Packaging Triad                                  │
//! │                                                                         │
//! │      A piece_per_case ──┐                                               │
//! │                         ├──► any two imply the third                    │
//! │      B case_per_pallet ─┤    C = A×B    B = C/A    A = C/B              │
//! │                         │                                               │
//! │      C pieces_per_pallet┘                                               │
//! │                                                                         │
//! │                        Availability                                     │
//! │                                                                         │
//! │      cartons ◄── ceil(pieces / A) ──┐        ┌── ceil(pieces / C) ──► pallets
//! │                                     │        │                          │
//! │                                  ┌──┴────────┴──┐                       │
//! │      cartons ── ceil(cartons×A) ►│    pieces    │◄ ceil(pallets×C) ── pallets
//! │                  (preferred)     └──────────────┘   (fallback)          │
//! │                                                                         │
//! │  Cartons and pallets never derive from each other directly:            │
//! │  every path goes through pieces, so each field takes one rounding.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline
//! ```text
//! OfferRecord
//!      │  PackagingFields::from_record   (coercion boundary)
//!      ▼
//! double-stackable? ──► apply_double_stackable (once)
//!      │
//!      ▼
//! ┌─────────── run_to_fixpoint (≤ max_iterations) ───────────┐
//! │   complete_triad ──► derive_availability ──► compare      │
//! └───────────────────────────────────────────────────────────┘
//!      │
//!      ▼
//! finalize_availability   (ceil or absent)
//!      │  PackagingFields::apply_to
//!      ▼
//! OfferRecord (+ CompletionReport)
//! ```
//!
//! ## Rules That Never Bend
//! 1. A present value is never overwritten (authority)
//! 2. Only pieces is reverse-derived
//! 3. Availability output is a positive integer or absent

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CoreResult;
use crate::quantity::Quantity;
use crate::types::{FieldValue, OfferRecord, PackagingField};
use crate::validation::validate_iteration_cap;
use crate::DEFAULT_MAX_ITERATIONS;

// =============================================================================
// Completion Options
// =============================================================================

/// Per-invocation settings for the completion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOptions {
    /// Physical stacking doubles available unit counts.
    pub double_stackable: bool,

    /// Upper bound on {triad → availability} passes. Must be 1..=32.
    pub max_iterations: usize,
}

impl CompletionOptions {
    /// Options with the given stacking flag and the default cap.
    pub fn new(double_stackable: bool) -> Self {
        CompletionOptions {
            double_stackable,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the iteration cap.
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Checks the options before any record is touched.
    pub fn validate(&self) -> CoreResult<()> {
        validate_iteration_cap(self.max_iterations as i64)?;
        Ok(())
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        CompletionOptions::new(false)
    }
}

// =============================================================================
// Packaging Fields (immutable snapshot)
// =============================================================================

/// The six packaging fields after coercion.
///
/// `Copy` on purpose: every pass takes a snapshot by value and returns a new
/// one, so "did anything change?" is a plain `==`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PackagingFields {
    pub piece_per_case: Quantity,
    pub case_per_pallet: Quantity,
    pub pieces_per_pallet: Quantity,
    pub availability_pieces: Quantity,
    pub availability_cartons: Quantity,
    pub availability_pallets: Quantity,
}

impl PackagingFields {
    /// Coerces the packaging fields of a record.
    pub fn from_record(record: &OfferRecord) -> Self {
        let q = |field| Quantity::coerce(record.field(field));
        PackagingFields {
            piece_per_case: q(PackagingField::PiecePerCase),
            case_per_pallet: q(PackagingField::CasePerPallet),
            pieces_per_pallet: q(PackagingField::PiecesPerPallet),
            availability_pieces: q(PackagingField::AvailabilityPieces),
            availability_cartons: q(PackagingField::AvailabilityCartons),
            availability_pallets: q(PackagingField::AvailabilityPallets),
        }
    }

    /// Returns one field by name.
    pub fn get(&self, field: PackagingField) -> Quantity {
        match field {
            PackagingField::PiecePerCase => self.piece_per_case,
            PackagingField::CasePerPallet => self.case_per_pallet,
            PackagingField::PiecesPerPallet => self.pieces_per_pallet,
            PackagingField::AvailabilityPieces => self.availability_pieces,
            PackagingField::AvailabilityCartons => self.availability_cartons,
            PackagingField::AvailabilityPallets => self.availability_pallets,
        }
    }

    /// The fields currently holding a valid number.
    pub fn populated(&self) -> BTreeSet<PackagingField> {
        PackagingField::ALL
            .into_iter()
            .filter(|field| self.get(*field).is_valid())
            .collect()
    }

    /// Writes the snapshot back onto a record.
    ///
    /// Triad fields are written only when the snapshot holds a number
    /// (fractions allowed); an unusable supplier value with nothing to
    /// replace it stays as the supplier sent it. Availability fields are
    /// expected to be finalized already and are written as integers, or
    /// cleared.
    pub fn apply_to(&self, record: &mut OfferRecord) {
        for field in PackagingField::ALL {
            let quantity = self.get(field);
            let slot = record.field_mut(field);
            if field.is_availability() {
                *slot = quantity.ceil().map(FieldValue::Integer);
            } else if let Some(value) = quantity.value() {
                *slot = Some(FieldValue::from_f64(value));
            }
        }
    }
}

// =============================================================================
// Triad Completion
// =============================================================================

/// Fills the one missing triad member from the other two.
///
/// ## Rules (in order; the first one to fill a field wins)
/// ```text
/// A, B valid, C absent → C = A × B
/// A, C valid, B absent → B = C / A
/// B, C valid, A absent → A = C / B
/// ```
/// No rounding: pieces-per-pallet may legitimately be `12 × 7.5 = 90`, and
/// cases-per-pallet may come out fractional.
pub fn complete_triad(fields: PackagingFields) -> PackagingFields {
    let mut next = fields;

    if let (Quantity::Valid(a), Quantity::Valid(b)) = (next.piece_per_case, next.case_per_pallet) {
        next.pieces_per_pallet = next.pieces_per_pallet.or_derive(|| Quantity::from_f64(a * b));
    }

    if let (Quantity::Valid(a), Quantity::Valid(c)) = (next.piece_per_case, next.pieces_per_pallet) {
        next.case_per_pallet = next.case_per_pallet.or_derive(|| Quantity::from_f64(c / a));
    }

    if let (Quantity::Valid(b), Quantity::Valid(c)) = (next.case_per_pallet, next.pieces_per_pallet) {
        next.piece_per_case = next.piece_per_case.or_derive(|| Quantity::from_f64(c / b));
    }

    next
}

// =============================================================================
// Availability Derivation
// =============================================================================

/// `ceil(numerator / divisor)`, or absent when either side is absent.
fn ceil_div(numerator: Quantity, divisor: Quantity) -> Quantity {
    match (numerator, divisor) {
        (Quantity::Valid(n), Quantity::Valid(d)) => Quantity::from(Quantity::from_f64(n / d).ceil().map(|v| v as f64)),
        _ => Quantity::Absent,
    }
}

/// `ceil(count × per_unit)`, or absent when either side is absent.
fn ceil_mul(count: Quantity, per_unit: Quantity) -> Quantity {
    match (count, per_unit) {
        (Quantity::Valid(n), Quantity::Valid(m)) => Quantity::from(Quantity::from_f64(n * m).ceil().map(|v| v as f64)),
        _ => Quantity::Absent,
    }
}

/// Pieces → cartons and pallets, each only where still absent.
fn forward_fill(mut fields: PackagingFields) -> PackagingFields {
    let pieces = fields.availability_pieces;
    fields.availability_cartons = fields
        .availability_cartons
        .or_derive(|| ceil_div(pieces, fields.piece_per_case));
    fields.availability_pallets = fields
        .availability_pallets
        .or_derive(|| ceil_div(pieces, fields.pieces_per_pallet));
    fields
}

/// Derives availability figures from whatever is known.
///
/// ## Stages
/// 1. **Forward**: pieces → cartons (÷A), pallets (÷C)
/// 2. **Reverse**: only if pieces is absent, cartons×A, else pallets×C
/// 3. **Cross-fill**: forward again with the (possibly new) pieces
///
/// Cartons are always preferred over pallets as the reverse source, even
/// when both are known.
pub fn derive_availability(fields: PackagingFields) -> PackagingFields {
    // Stage 1: forward
    let mut next = forward_fill(fields);

    // Stage 2: reverse (pieces only)
    if next.availability_pieces.is_absent() {
        let from_cartons = ceil_mul(next.availability_cartons, next.piece_per_case);
        next.availability_pieces = if from_cartons.is_valid() {
            from_cartons
        } else {
            ceil_mul(next.availability_pallets, next.pieces_per_pallet)
        };
    }

    // Stage 3: cross-fill
    forward_fill(next)
}

// =============================================================================
// Double-Stackable Adjustment
// =============================================================================

/// Doubles every valid availability figure. Absent figures stay absent.
///
/// Applied once per record, before the fixpoint loop, so derived values are
/// computed from the doubled counts.
pub fn apply_double_stackable(fields: PackagingFields) -> PackagingFields {
    PackagingFields {
        availability_pieces: fields.availability_pieces.doubled(),
        availability_cartons: fields.availability_cartons.doubled(),
        availability_pallets: fields.availability_pallets.doubled(),
        ..fields
    }
}

// =============================================================================
// Fixpoint Driver & Finalization
// =============================================================================

/// One full pass: triad completion followed by availability derivation.
pub fn complete_pass(fields: PackagingFields) -> PackagingFields {
    derive_availability(complete_triad(fields))
}

/// Result of [`run_to_fixpoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixpointOutcome {
    pub fields: PackagingFields,
    /// Passes actually executed (the final, unchanged pass included).
    pub iterations: usize,
    /// True when a pass produced no change before the cap was hit.
    pub converged: bool,
}

/// Repeats [`complete_pass`] until nothing changes or `max_iterations`
/// passes have run.
///
/// Each pass can only fill absent fields, so the loop is monotone and
/// settles in at most as many passes as there are fields to fill. The cap
/// is a safety bound.
pub fn run_to_fixpoint(fields: PackagingFields, max_iterations: usize) -> FixpointOutcome {
    let mut current = fields;

    for iteration in 1..=max_iterations {
        let next = complete_pass(current);
        if next == current {
            return FixpointOutcome {
                fields: next,
                iterations: iteration,
                converged: true,
            };
        }
        current = next;
    }

    FixpointOutcome {
        fields: current,
        iterations: max_iterations,
        converged: false,
    }
}

/// Rounds every availability figure up to a whole count.
///
/// Anything that cannot be a positive integer becomes absent. Triad fields
/// are left as they are.
pub fn finalize_availability(fields: PackagingFields) -> PackagingFields {
    let whole = |q: Quantity| Quantity::from(q.ceil().map(|v| v as f64));
    PackagingFields {
        availability_pieces: whole(fields.availability_pieces),
        availability_cartons: whole(fields.availability_cartons),
        availability_pallets: whole(fields.availability_pallets),
        ..fields
    }
}

// =============================================================================
// Record-Level Entry Points
// =============================================================================

/// What the engine did to one record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Fields that were absent on input and hold a value on output.
    pub derived: BTreeSet<PackagingField>,
    /// Availability fields that held a raw value on input that coerced to
    /// absent and are absent on output (e.g. `"0"`, `"n/a"`).
    pub discarded: BTreeSet<PackagingField>,
    /// Fixpoint passes executed.
    pub iterations: usize,
    /// False when the iteration cap cut the loop short.
    pub converged: bool,
    /// Whether the double-stackable adjustment was applied.
    pub doubled: bool,
}

/// A completed record together with its report.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub record: OfferRecord,
    pub report: CompletionReport,
}

/// Completes one record.
///
/// ## Errors
/// Only for caller misuse: an iteration cap outside `1..=32`. Malformed
/// numbers on the record never fail; they are treated as absent.
///
/// ## Example
/// ```rust
/// use offer_core::packaging::{complete_record, CompletionOptions};
/// use offer_core::types::{FieldValue, OfferRecord, PackagingField};
///
/// let record = OfferRecord::default()
///     .with(PackagingField::AvailabilityPieces, 130u64)
///     .with(PackagingField::PiecePerCase, 12u64);
///
/// let done = complete_record(record, &CompletionOptions::default()).unwrap();
/// assert_eq!(done.record.availability_cartons, Some(FieldValue::Integer(11)));
/// ```
pub fn complete_record(record: OfferRecord, options: &CompletionOptions) -> CoreResult<Completion> {
    options.validate()?;
    Ok(complete_validated(record, options))
}

/// Completes a batch of records with one options check up front.
pub fn complete_records(
    records: Vec<OfferRecord>,
    options: &CompletionOptions,
) -> CoreResult<Vec<Completion>> {
    options.validate()?;
    Ok(records
        .into_iter()
        .map(|record| complete_validated(record, options))
        .collect())
}

fn complete_validated(mut record: OfferRecord, options: &CompletionOptions) -> Completion {
    let input = PackagingFields::from_record(&record);

    let start = if options.double_stackable {
        apply_double_stackable(input)
    } else {
        input
    };

    let outcome = run_to_fixpoint(start, options.max_iterations);
    let output = finalize_availability(outcome.fields);

    let before = input.populated();
    let after = output.populated();
    let raw_present: Vec<PackagingField> = PackagingField::ALL
        .into_iter()
        .filter(|field| record.field(*field).is_some())
        .collect();

    output.apply_to(&mut record);

    let discarded = raw_present
        .into_iter()
        .filter(|field| record.field(*field).is_none())
        .collect();

    Completion {
        record,
        report: CompletionReport {
            derived: after.difference(&before).copied().collect(),
            discarded,
            iterations: outcome.iterations,
            converged: outcome.converged,
            doubled: options.double_stackable,
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
