//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a clinical interface for:
//! - Dashboard with history and stage distribution
//! - Single-patient eGFR calculation
//! - Result display with staging and recommendation
//! - Batch import from record files (Clinician mode)

mod app;
mod styles;
mod ui;
mod worker;

pub use app::{App, Screen};
pub use styles::ClinicalTheme;
pub use worker::{BatchProgress, BatchWorker, BatchWorkerHandle};
