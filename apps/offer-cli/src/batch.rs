//! # Batch Completion
//!
//! Runs the completion engine over a file of offer records.
//!
//! ## Flow
//! ```text
//! records.json ──► read_records ──► run_batch ──────────────► write_records ──► out.json / stdout
//!                                    │  complete_records           │
//!                                    │  (assign article numbers)   │
//!                                    └──► BatchSummary (logged) ───┘
//! ```
//!
//! Each row is read on its own. A row that does not fit the offer record
//! shape is logged and written back exactly as it came in; it never fails
//! the rest of the batch.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use offer_core::{complete_records, CompletionOptions, OfferRecord};
use offer_store::ArticleNumberStore;

/// Totals for one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Rows in the batch, readable or not.
    pub records: usize,
    /// Rows passed through untouched because they were not offer records.
    pub unreadable: usize,
    /// Fields filled in across all records.
    pub derived_fields: usize,
    /// Records where the iteration cap cut completion short.
    pub not_converged: usize,
    pub article_numbers_assigned: usize,
}

/// One row of an input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchRow {
    Record(OfferRecord),
    /// Not an offer record (e.g. a numeric `ean`); carried through as-is.
    Unreadable(Value),
}

impl BatchRow {
    /// Interprets one JSON value; `row` is the 1-based position for logs.
    pub fn from_value(row: usize, value: Value) -> Self {
        match serde_json::from_value::<OfferRecord>(value.clone()) {
            Ok(record) => BatchRow::Record(record),
            Err(e) => {
                warn!(row, error = %e, "Row is not an offer record, passing it through");
                BatchRow::Unreadable(value)
            }
        }
    }

    /// The record, if this row could be read as one.
    pub fn record(&self) -> Option<&OfferRecord> {
        match self {
            BatchRow::Record(record) => Some(record),
            BatchRow::Unreadable(_) => None,
        }
    }
}

/// Reads a JSON array of offer records.
///
/// Only a file that is not a JSON array is an error; individual rows are
/// judged one by one.
pub fn read_records(path: &Path) -> Result<Vec<BatchRow>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;
    let values: Vec<Value> = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON array", path.display()))?;

    let rows: Vec<BatchRow> = values
        .into_iter()
        .enumerate()
        .map(|(i, value)| BatchRow::from_value(i + 1, value))
        .collect();

    debug!(path = %path.display(), count = rows.len(), "Read records");
    Ok(rows)
}

/// Completes every readable record and, when a store is given, assigns
/// article numbers to records that lack one.
///
/// Rows come back in input order.
pub fn run_batch(
    rows: Vec<BatchRow>,
    options: &CompletionOptions,
    store: Option<&ArticleNumberStore>,
) -> Result<(Vec<BatchRow>, BatchSummary)> {
    let batch_id = Uuid::new_v4();
    let started_at = Utc::now();
    let total = rows.len();

    info!(
        batch_id = %batch_id,
        records = total,
        double_stackable = options.double_stackable,
        max_iterations = options.max_iterations,
        "Starting completion batch"
    );

    // None marks the position of the next readable record
    let mut layout: Vec<Option<Value>> = Vec::with_capacity(total);
    let mut records = Vec::new();
    for row in rows {
        match row {
            BatchRow::Record(record) => {
                records.push(record);
                layout.push(None);
            }
            BatchRow::Unreadable(value) => layout.push(Some(value)),
        }
    }
    let unreadable = total - records.len();

    let completions = complete_records(records, options).context("Invalid completion options")?;

    let mut derived_fields = 0;
    let mut not_converged = 0;
    let mut completed = Vec::with_capacity(completions.len());

    for completion in completions {
        let report = &completion.report;
        derived_fields += report.derived.len();

        if !report.converged {
            not_converged += 1;
            warn!(
                batch_id = %batch_id,
                source_row = ?completion.record.source_row,
                iterations = report.iterations,
                "Record hit the iteration cap before settling"
            );
        }

        if !report.discarded.is_empty() {
            debug!(
                source_row = ?completion.record.source_row,
                discarded = ?report.discarded,
                "Dropped unusable values"
            );
        }

        completed.push(completion.record);
    }

    let article_numbers_assigned = match store {
        Some(store) => store
            .assign(&mut completed)
            .context("Failed to assign article numbers")?,
        None => 0,
    };

    let mut completed = completed.into_iter();
    let rows: Vec<BatchRow> = layout
        .into_iter()
        .filter_map(|slot| match slot {
            Some(value) => Some(BatchRow::Unreadable(value)),
            None => completed.next().map(BatchRow::Record),
        })
        .collect();

    let summary = BatchSummary {
        batch_id,
        started_at,
        records: rows.len(),
        unreadable,
        derived_fields,
        not_converged,
        article_numbers_assigned,
    };

    info!(
        batch_id = %summary.batch_id,
        records = summary.records,
        unreadable = summary.unreadable,
        derived_fields = summary.derived_fields,
        not_converged = summary.not_converged,
        article_numbers_assigned = summary.article_numbers_assigned,
        "Completion batch finished"
    );

    Ok((rows, summary))
}

/// Writes rows as pretty JSON to a file, or to stdout when no path is
/// given.
pub fn write_records(rows: &[BatchRow], output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize records")?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            debug!(path = %path.display(), count = rows.len(), "Wrote records");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use offer_core::{ArticleNumberConfig, FieldValue, PackagingField};
    use tempfile::tempdir;

    const INPUT: &str = r#"[
        {"ean": "4001234567890", "piece_per_case": 12, "case_per_pallet": 10, "availability_pieces": "130"},
        {"ean": "8712345678906", "article_number": "AC00000001", "availability_cartons": "5", "piece_per_case": "12,0"},
        {"ean": "5000000000000", "availability_pieces": "0"}
    ]"#;

    fn rows(json: &str) -> Vec<BatchRow> {
        let values: Vec<Value> = serde_json::from_str(json).unwrap();
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| BatchRow::from_value(i + 1, v))
            .collect()
    }

    fn record(row: &BatchRow) -> &OfferRecord {
        row.record().unwrap()
    }

    #[test]
    fn test_read_complete_write() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.json");
        let output = dir.path().join("out").join("completed.json");
        fs::write(&input, INPUT).unwrap();

        let records = read_records(&input).unwrap();
        let (completed, summary) = run_batch(records, &CompletionOptions::default(), None).unwrap();

        assert_eq!(summary.records, 3);
        assert_eq!(summary.unreadable, 0);
        assert_eq!(summary.not_converged, 0);
        assert_eq!(summary.article_numbers_assigned, 0);
        // row 1: C, cartons, pallets; row 2: pieces
        assert_eq!(summary.derived_fields, 4);

        assert_eq!(record(&completed[0]).pieces_per_pallet, Some(FieldValue::Integer(120)));
        assert_eq!(record(&completed[0]).availability_cartons, Some(FieldValue::Integer(11)));
        assert_eq!(record(&completed[0]).availability_pallets, Some(FieldValue::Integer(2)));
        assert_eq!(record(&completed[1]).availability_pieces, Some(FieldValue::Integer(60)));
        assert_eq!(record(&completed[2]).availability_pieces, None);

        write_records(&completed, Some(&output)).unwrap();
        let reread = read_records(&output).unwrap();
        assert_eq!(reread, completed);
    }

    #[test]
    fn test_unreadable_row_does_not_stop_the_batch() {
        let input = r#"[
            {"ean": 4001234567890, "piece_per_case": 12, "case_per_pallet": 10},
            {"ean": "8712345678906", "piece_per_case": 6, "case_per_pallet": 20},
            {"ean": "5000000000000", "source_row": "seven"}
        ]"#;

        let (completed, summary) = run_batch(rows(input), &CompletionOptions::default(), None).unwrap();
        assert_eq!(summary.records, 3);
        assert_eq!(summary.unreadable, 2);

        let originals: Vec<Value> = serde_json::from_str(input).unwrap();
        assert_eq!(completed[0], BatchRow::Unreadable(originals[0].clone()));
        assert_eq!(record(&completed[1]).pieces_per_pallet, Some(FieldValue::Integer(120)));
        assert_eq!(completed[2], BatchRow::Unreadable(originals[2].clone()));

        // written back byte-for-byte equivalent
        let written: Vec<Value> = serde_json::from_str(&serde_json::to_string(&completed).unwrap()).unwrap();
        assert_eq!(written[0], originals[0]);
        assert_eq!(written[2], originals[2]);
    }

    #[test]
    fn test_unknown_keys_pass_through_the_batch() {
        let input = r#"[{"ean": "1", "supplier": "ACME", "currency": "EUR", "piece_per_case": 12, "case_per_pallet": 10}]"#;

        let (completed, _) = run_batch(rows(input), &CompletionOptions::default(), None).unwrap();
        let written: Vec<Value> = serde_json::from_str(&serde_json::to_string(&completed).unwrap()).unwrap();

        assert_eq!(written[0]["supplier"], "ACME");
        assert_eq!(written[0]["currency"], "EUR");
        assert_eq!(written[0]["pieces_per_pallet"], 120);
        // nothing the input lacked appears as null
        assert!(written[0].get("article_number").is_none());
    }

    #[test]
    fn test_assigns_article_numbers_when_store_given() {
        let dir = tempdir().unwrap();
        let store = ArticleNumberStore::open(dir.path().join("counter.json"), ArticleNumberConfig::default()).unwrap();

        let (completed, summary) = run_batch(rows(INPUT), &CompletionOptions::default(), Some(&store)).unwrap();

        assert_eq!(summary.article_numbers_assigned, 2);
        assert_eq!(record(&completed[0]).article_number.as_deref(), Some("AC00001000"));
        assert_eq!(record(&completed[1]).article_number.as_deref(), Some("AC00000001"));
        assert_eq!(record(&completed[2]).article_number.as_deref(), Some("AC00001001"));
    }

    #[test]
    fn test_invalid_options_fail_the_batch() {
        let options = CompletionOptions::default().max_iterations(0);
        let record = OfferRecord::default().with(PackagingField::PiecePerCase, 6u64);
        assert!(run_batch(vec![BatchRow::Record(record)], &options, None).is_err());
    }

    #[test]
    fn test_non_array_input_is_rejected() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.json");
        fs::write(&input, r#"{"ean": "1"}"#).unwrap();
        assert!(read_records(&input).is_err());
    }
}
