//! Calculation service: Orchestrates calculation and persistence.
//!
//! This service coordinates:
//! - Record parsing and the engine pipeline
//! - Storage persistence
//! - Batch runs over a record source
//! - History queries for the dashboard

use std::sync::Arc;

use super::batch::{process_batch_with, BatchReport};
use super::EgfrEngine;
use crate::adapters::StorageError;
use crate::domain::{Calculation, CkdStage, PatientRecord, UserMode};
use crate::ports::{CalculationPage, RecordSource, Storage};
use crate::NephrolensError;

/// Stage counts over a window of recent calculations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageSummary {
    /// Indexed by stage number - 1
    pub counts: [usize; 5],
    pub total: usize,
}

impl StageSummary {
    #[must_use]
    pub fn count(&self, stage: CkdStage) -> usize {
        self.counts[usize::from(stage.number()) - 1]
    }

    /// Share of the window in `stage`, 0.0 when the window is empty.
    #[must_use]
    pub fn fraction(&self, stage: CkdStage) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(stage) as f64 / self.total as f64
        }
    }
}

/// Service for running and recording eGFR calculations.
pub struct CalculationService<S>
where
    S: Storage,
{
    engine: EgfrEngine,
    storage: Arc<S>,
}

impl<S> CalculationService<S>
where
    S: Storage,
    S::Error: Into<StorageError>,
{
    /// Create a new calculation service.
    pub fn new(engine: EgfrEngine, storage: Arc<S>) -> Self {
        Self { engine, storage }
    }

    #[must_use]
    pub fn engine(&self) -> EgfrEngine {
        self.engine
    }

    /// Calculate one record and persist it.
    ///
    /// A persistence failure is logged and the calculation is still
    /// returned.
    ///
    /// # Errors
    /// Returns error if the record is invalid.
    pub fn calculate(
        &self,
        record: &PatientRecord,
        mode: UserMode,
    ) -> Result<Calculation, NephrolensError> {
        tracing::debug!("Parsing record...");
        let (subject, creatinine) = record.parse()?;

        tracing::debug!("Running {} pipeline...", self.engine.coefficients().name());
        let result = self.engine.calculate(&subject, &creatinine)?;

        let calculation = Calculation::new(subject, creatinine, result, mode)
            .with_patient_ref(record.patient_ref.clone());

        if let Err(e) = self.storage.save_calculation(&calculation) {
            tracing::warn!("Failed to save calculation: {:?}", e);
        }

        tracing::info!(
            "Calculation complete: egfr={:.2}, stage={}, equation={}, mode={}",
            calculation.result.rate,
            calculation.result.stage.number(),
            calculation.result.equation,
            mode.as_str()
        );

        Ok(calculation)
    }

    /// Calculate a batch and persist every successful row.
    #[must_use]
    pub fn run_batch(&self, records: &[PatientRecord]) -> BatchReport {
        self.run_batch_with_progress(records, |_, _| {})
    }

    /// Like [`Self::run_batch`], reporting `(done, total)` after each row.
    pub fn run_batch_with_progress<F>(&self, records: &[PatientRecord], progress: F) -> BatchReport
    where
        F: FnMut(usize, usize),
    {
        tracing::info!("Starting batch of {} records", records.len());
        let mut saved = 0usize;
        let report = process_batch_with(&self.engine, records, progress, |row| {
            let calculation = Calculation::new(
                row.subject,
                row.creatinine,
                row.result.clone(),
                UserMode::Clinician,
            )
            .with_patient_ref(row.record.patient_ref.clone());
            match self.storage.save_calculation(&calculation) {
                Ok(()) => saved += 1,
                Err(e) => tracing::warn!("Failed to save batch row {}: {:?}", row.row, e),
            }
        });

        tracing::info!(
            "Batch complete: {} ok, {} failed, {} saved",
            report.success_count(),
            report.failure_count(),
            saved
        );
        report
    }

    /// Load a record source and run it as a batch.
    ///
    /// # Errors
    /// Returns error if the source cannot be loaded.
    pub fn run_source<R, F>(&self, source: &R, progress: F) -> Result<BatchReport, NephrolensError>
    where
        R: RecordSource,
        R::Error: Into<NephrolensError>,
        F: FnMut(usize, usize),
    {
        tracing::info!("Loading records from {}", source.describe());
        let records = source.load().map_err(|e| -> NephrolensError { e.into() })?;
        Ok(self.run_batch_with_progress(&records, progress))
    }

    /// Get recent calculations from storage.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn recent(&self, limit: usize) -> Result<Vec<Calculation>, NephrolensError> {
        self.storage
            .load_recent_calculations(limit)
            .map_err(|e| NephrolensError::Storage(e.into()))
    }

    /// Get one page of stored calculations.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn page(&self, offset: usize, limit: usize) -> Result<CalculationPage, NephrolensError> {
        self.storage
            .load_calculations_paginated(offset, limit)
            .map_err(|e| NephrolensError::Storage(e.into()))
    }

    /// Get total calculation count.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn count(&self) -> Result<usize, NephrolensError> {
        self.storage
            .count_calculations()
            .map_err(|e| NephrolensError::Storage(e.into()))
    }

    /// Stage distribution over the `limit` most recent calculations.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn stage_summary(&self, limit: usize) -> Result<StageSummary, NephrolensError> {
        let mut summary = StageSummary::default();
        for calc in self.recent(limit)? {
            summary.counts[usize::from(calc.result.stage.number()) - 1] += 1;
            summary.total += 1;
        }
        Ok(summary)
    }

    /// Delete every stored calculation.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn clear_history(&self) -> Result<(), NephrolensError> {
        self.storage
            .clear_all()
            .map_err(|e| NephrolensError::Storage(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::domain::EgfrError;

    fn create_test_service() -> CalculationService<SqliteStorage> {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        CalculationService::new(EgfrEngine::default(), storage)
    }

    fn record(age: &str, creatinine: &str) -> PatientRecord {
        PatientRecord {
            patient_ref: Some(format!("ref-{age}")),
            age: age.to_string(),
            gender: "female".to_string(),
            ethnicity: Some("non-black".to_string()),
            creatinine: creatinine.to_string(),
            unit: "mg/dL".to_string(),
            height: Some("140".to_string()),
        }
    }

    #[test]
    fn test_calculate_persists() {
        let service = create_test_service();
        let calc = service
            .calculate(&record("40", "1.0"), UserMode::Patient)
            .expect("Should calculate");

        assert_eq!(calc.result.rate, 65.27);
        assert_eq!(calc.result.stage, CkdStage::G2);
        assert_eq!(calc.patient_ref.as_deref(), Some("ref-40"));
        assert_eq!(service.count().expect("Should count"), 1);

        let recent = service.recent(5).expect("Should load");
        assert_eq!(recent[0].id, calc.id);
    }

    #[test]
    fn test_invalid_record_is_not_persisted() {
        let service = create_test_service();
        let err = service
            .calculate(&record("40", "-1"), UserMode::Clinician)
            .expect_err("Should reject");
        assert!(matches!(
            err,
            NephrolensError::Egfr(EgfrError::InvalidValue { .. })
        ));
        assert_eq!(service.count().expect("Should count"), 0);
        assert_eq!(
            err.to_string(),
            "Invalid value for creatinine: -1 must be greater than zero"
        );
    }

    #[test]
    fn test_domain_error_message_is_not_prefixed_twice() {
        let err = NephrolensError::from(EgfrError::InvalidInput("age must be set".to_string()));
        assert_eq!(err.to_string(), "Invalid input: age must be set");
    }

    #[test]
    fn test_batch_persists_successes_only() {
        let service = create_test_service();
        let records = vec![record("40", "1.0"), record("41", "n/a"), record("9", "0.6")];
        let report = service.run_batch(&records);

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(service.count().expect("Should count"), 2);

        let mut saved: Vec<(Option<String>, f64, UserMode)> = service
            .recent(10)
            .expect("Should load")
            .into_iter()
            .map(|c| (c.patient_ref, c.creatinine.value, c.mode))
            .collect();
        saved.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            saved,
            vec![
                (Some("ref-40".to_string()), 1.0, UserMode::Clinician),
                (Some("ref-9".to_string()), 0.6, UserMode::Clinician),
            ]
        );
    }

    #[test]
    fn test_run_source_from_vec() {
        let service = create_test_service();
        let records = vec![record("40", "1.0"), record("60", "4.0")];
        let report = service
            .run_source(&records, |_, _| {})
            .expect("Should run");
        assert_eq!(report.success_count(), 2);
    }

    #[test]
    fn test_stage_summary() {
        let service = create_test_service();
        service
            .calculate(&record("40", "1.0"), UserMode::Patient)
            .expect("Should calculate");
        service
            .calculate(&record("40", "1.1"), UserMode::Patient)
            .expect("Should calculate");

        let summary = service.stage_summary(10).expect("Should summarize");
        assert_eq!(summary.total, 2);
        assert_eq!(summary.count(CkdStage::G2), 1);
        assert_eq!(summary.count(CkdStage::G3), 1);
        assert!((summary.fraction(CkdStage::G3) - 0.5).abs() < f64::EPSILON);

        service.clear_history().expect("Should clear");
        assert_eq!(service.stage_summary(10).expect("Should summarize").total, 0);
    }
}
