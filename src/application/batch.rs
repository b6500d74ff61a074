//! Batch calculation over many records.
//!
//! Rows are independent: one failing row never aborts the others, and the
//! report keeps input order with 1-based row numbers.

use super::EgfrEngine;
use crate::domain::{EgfrError, EgfrResult, Measurement, PatientRecord, Subject};

/// Outcome for a single input row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome {
    /// 1-based position in the input
    pub row: usize,
    pub patient_ref: Option<String>,
    pub outcome: Result<EgfrResult, EgfrError>,
}

impl RowOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-row outcomes in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub rows: Vec<RowOutcome>,
}

impl BatchReport {
    pub fn successes(&self) -> impl Iterator<Item = (&RowOutcome, &EgfrResult)> {
        self.rows
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|res| (r, res)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&RowOutcome, &EgfrError)> {
        self.rows
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|err| (r, err)))
    }

    #[must_use]
    pub fn success_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_ok()).count()
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.rows.len() - self.success_count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row that calculated, with the inputs parsed from it.
#[derive(Debug)]
pub struct CalculatedRow<'a> {
    /// 1-based position in the input
    pub row: usize,
    pub record: &'a PatientRecord,
    pub subject: Subject,
    pub creatinine: Measurement,
    pub result: &'a EgfrResult,
}

/// Calculate every record.
#[must_use]
pub fn process_batch(engine: &EgfrEngine, records: &[PatientRecord]) -> BatchReport {
    process_batch_with_progress(engine, records, |_, _| {})
}

/// Calculate every record, reporting `(done, total)` after each row.
pub fn process_batch_with_progress<F>(
    engine: &EgfrEngine,
    records: &[PatientRecord],
    progress: F,
) -> BatchReport
where
    F: FnMut(usize, usize),
{
    process_batch_with(engine, records, progress, |_| {})
}

/// Calculate every record, handing each successful row and its parsed inputs
/// to `on_calculated` before reporting progress.
pub fn process_batch_with<F, G>(
    engine: &EgfrEngine,
    records: &[PatientRecord],
    mut progress: F,
    mut on_calculated: G,
) -> BatchReport
where
    F: FnMut(usize, usize),
    G: FnMut(CalculatedRow<'_>),
{
    let total = records.len();
    let mut rows = Vec::with_capacity(total);

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;
        let outcome = record.parse().and_then(|(subject, creatinine)| {
            let result = engine.calculate(&subject, &creatinine)?;
            on_calculated(CalculatedRow {
                row,
                record,
                subject,
                creatinine,
                result: &result,
            });
            Ok(result)
        });
        if let Err(e) = &outcome {
            tracing::debug!("Row {} rejected ({}): {}", row, e.kind(), e);
        }
        rows.push(RowOutcome {
            row,
            patient_ref: record.patient_ref.clone(),
            outcome,
        });
        progress(row, total);
    }

    BatchReport { rows }
}
