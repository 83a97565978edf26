//! # Domain Types
//!
//! Core domain types used throughout Offer Desk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────────┐   ┌─────────────────┐   ┌─────────────────┐  │
//! │  │    OfferRecord       │   │   FieldValue    │   │ PackagingField  │  │
//! │  │  ──────────────────  │   │  ─────────────  │   │  ─────────────  │  │
//! │  │  ean, description    │   │  Bool           │   │  PiecePerCase   │  │
//! │  │  packaging triad     │──►│  Integer(u64)   │   │  CasePerPallet  │  │
//! │  │  availability x3     │   │  Number(f64)    │   │  PiecesPerPallet│  │
//! │  │  price, source info  │   │  Text(String)   │   │  Availability*  │  │
//! │  └──────────────────────┘   └─────────────────┘   └─────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Field Names
//! The serialized field names are the contract with the extraction pipeline
//! upstream and the spreadsheet writer downstream. Do not rename them.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

// =============================================================================
// Field Value
// =============================================================================

/// A numeric field exactly as the extraction pipeline delivered it.
///
/// ## Why Untagged?
/// JSON `12`, `12.5`, `"12,5"` and `true` all deserialize without a wrapper
/// object, and serialize back to the same shape. Finalized availability
/// values are written as `Integer`, so output shows `11`, never `11.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum FieldValue {
    /// A JSON boolean. Never a valid quantity.
    Bool(bool),
    /// A non-negative whole number.
    Integer(u64),
    /// Any other JSON number.
    Number(f64),
    /// Text, possibly holding a numeral with a decimal comma.
    Text(String),
}

impl FieldValue {
    /// Builds the representation for a computed number.
    ///
    /// Whole, non-negative values become `Integer` so they serialize
    /// without a trailing `.0`.
    pub fn from_f64(value: f64) -> Self {
        if value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64 {
            FieldValue::Integer(value as u64)
        } else {
            FieldValue::Number(value)
        }
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

// =============================================================================
// Packaging Field
// =============================================================================

/// The six fields the completion engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PackagingField {
    /// Triad member A.
    PiecePerCase,
    /// Triad member B.
    CasePerPallet,
    /// Triad member C.
    PiecesPerPallet,
    AvailabilityPieces,
    AvailabilityCartons,
    AvailabilityPallets,
}

impl PackagingField {
    /// All six fields, triad first.
    pub const ALL: [PackagingField; 6] = [
        PackagingField::PiecePerCase,
        PackagingField::CasePerPallet,
        PackagingField::PiecesPerPallet,
        PackagingField::AvailabilityPieces,
        PackagingField::AvailabilityCartons,
        PackagingField::AvailabilityPallets,
    ];

    /// The three availability fields.
    pub const AVAILABILITY: [PackagingField; 3] = [
        PackagingField::AvailabilityPieces,
        PackagingField::AvailabilityCartons,
        PackagingField::AvailabilityPallets,
    ];

    /// The record field name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PackagingField::PiecePerCase => "piece_per_case",
            PackagingField::CasePerPallet => "case_per_pallet",
            PackagingField::PiecesPerPallet => "pieces_per_pallet",
            PackagingField::AvailabilityPieces => "availability_pieces",
            PackagingField::AvailabilityCartons => "availability_cartons",
            PackagingField::AvailabilityPallets => "availability_pallets",
        }
    }

    /// Checks if this is one of the availability fields.
    pub const fn is_availability(&self) -> bool {
        matches!(
            self,
            PackagingField::AvailabilityPieces
                | PackagingField::AvailabilityCartons
                | PackagingField::AvailabilityPallets
        )
    }
}

impl fmt::Display for PackagingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Offer Record
// =============================================================================

/// One supplier offer line, normalized into the canonical field set.
///
/// Everything except the six packaging fields is opaque to the engine and
/// passed through untouched, including keys this struct does not name.
/// Absent fields are omitted on output rather than written as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfferRecord {
    /// Internal article number (e.g. `AC00001000`), assigned by the allocator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_number: Option<String>,

    /// EAN / barcode as printed on the offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,

    /// Net content, e.g. `330ML` or `1.5KG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Label languages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,

    /// Pieces per case (triad A).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub piece_per_case: Option<FieldValue>,

    /// Cases per pallet (triad B).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_per_pallet: Option<FieldValue>,

    /// Pieces per pallet (triad C).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pieces_per_pallet: Option<FieldValue>,

    /// Best-before date, free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbd: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_cartons: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_pieces: Option<FieldValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_pallets: Option<FieldValue>,

    /// Unit price in EUR. Not touched by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_unit_eur: Option<FieldValue>,

    /// File the record was extracted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    /// 1-based row within the source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_row: Option<u64>,

    /// Every other key the extraction pipeline produced (supplier, currency,
    /// ...), carried through untouched.
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OfferRecord {
    /// Returns the raw value of a packaging field.
    pub fn field(&self, field: PackagingField) -> Option<&FieldValue> {
        match field {
            PackagingField::PiecePerCase => self.piece_per_case.as_ref(),
            PackagingField::CasePerPallet => self.case_per_pallet.as_ref(),
            PackagingField::PiecesPerPallet => self.pieces_per_pallet.as_ref(),
            PackagingField::AvailabilityPieces => self.availability_pieces.as_ref(),
            PackagingField::AvailabilityCartons => self.availability_cartons.as_ref(),
            PackagingField::AvailabilityPallets => self.availability_pallets.as_ref(),
        }
    }

    /// Returns a mutable slot for a packaging field.
    pub fn field_mut(&mut self, field: PackagingField) -> &mut Option<FieldValue> {
        match field {
            PackagingField::PiecePerCase => &mut self.piece_per_case,
            PackagingField::CasePerPallet => &mut self.case_per_pallet,
            PackagingField::PiecesPerPallet => &mut self.pieces_per_pallet,
            PackagingField::AvailabilityPieces => &mut self.availability_pieces,
            PackagingField::AvailabilityCartons => &mut self.availability_cartons,
            PackagingField::AvailabilityPallets => &mut self.availability_pallets,
        }
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, field: PackagingField, value: impl Into<FieldValue>) -> Self {
        *self.field_mut(field) = Some(value.into());
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_deserializes_loose_json() {
        let values: Vec<FieldValue> = serde_json::from_str(r#"[12, 12.5, "12,5", true, -3]"#).unwrap();
        assert_eq!(values[0], FieldValue::Integer(12));
        assert_eq!(values[1], FieldValue::Number(12.5));
        assert_eq!(values[2], FieldValue::Text("12,5".to_string()));
        assert_eq!(values[3], FieldValue::Bool(true));
        assert_eq!(values[4], FieldValue::Number(-3.0));
    }

    #[test]
    fn test_field_value_from_f64() {
        assert_eq!(FieldValue::from_f64(120.0), FieldValue::Integer(120));
        assert_eq!(FieldValue::from_f64(8.5), FieldValue::Number(8.5));
        assert_eq!(serde_json::to_string(&FieldValue::from_f64(11.0)).unwrap(), "11");
    }

    #[test]
    fn test_record_missing_fields_default_to_none() {
        let record: OfferRecord =
            serde_json::from_str(r#"{"ean": "4001234567890", "piece_per_case": 12}"#).unwrap();
        assert_eq!(record.ean.as_deref(), Some("4001234567890"));
        assert_eq!(record.piece_per_case, Some(FieldValue::Integer(12)));
        assert!(record.availability_pieces.is_none());
        assert!(record.article_number.is_none());
    }

    #[test]
    fn test_unknown_keys_survive_a_round_trip() {
        let input = r#"{"ean":"1","supplier":"ACME","piece_per_case":12,"currency":{"code":"EUR"}}"#;
        let record: OfferRecord = serde_json::from_str(input).unwrap();
        assert_eq!(record.extra["supplier"], "ACME");

        let output: serde_json::Value = serde_json::to_value(&record).unwrap();
        let expected: serde_json::Value = serde_json::from_str(input).unwrap();
        assert_eq!(output, expected);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let record = OfferRecord {
            ean: Some("4001234567890".to_string()),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"ean":"4001234567890"}"#);
        assert_eq!(serde_json::to_string(&OfferRecord::default()).unwrap(), "{}");
    }

    #[test]
    fn test_field_accessors() {
        let mut record = OfferRecord::default().with(PackagingField::CasePerPallet, 10u64);
        assert_eq!(
            record.field(PackagingField::CasePerPallet),
            Some(&FieldValue::Integer(10))
        );

        *record.field_mut(PackagingField::AvailabilityPallets) = Some(FieldValue::Integer(2));
        assert_eq!(record.availability_pallets, Some(FieldValue::Integer(2)));
    }

    #[test]
    fn test_packaging_field_names() {
        assert_eq!(PackagingField::PiecePerCase.as_str(), "piece_per_case");
        assert_eq!(PackagingField::AvailabilityCartons.to_string(), "availability_cartons");
        assert!(PackagingField::AvailabilityPallets.is_availability());
        assert!(!PackagingField::PiecesPerPallet.is_availability());
        assert_eq!(
            serde_json::to_string(&PackagingField::PiecesPerPallet).unwrap(),
            "\"pieces_per_pallet\""
        );
    }
}
