//! # Nephrolens
//!
//! Estimated glomerular filtration rate (eGFR) calculation and chronic
//! kidney disease staging.
//!
//! This crate provides:
//! - Creatinine unit normalization (mg/dL and µmol/L)
//! - MDRD (adults) and bedside Schwartz (children) estimation
//! - KDIGO G1-G5 staging with population-specific recommendations
//! - Batch calculation, local history and a terminal UI
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types and the pure calculation pipeline
//! - `ports`: Trait definitions for storage and record sources
//! - `adapters`: Concrete implementations (SQLite, JSON record files, log redaction)
//! - `application`: Engine, batch processing and the calculation service
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use application::{CalculationService, EgfrEngine};
pub use config::AppConfig;
pub use domain::{CkdStage, EgfrError, EgfrResult};

/// Result type for Nephrolens operations
pub type Result<T> = std::result::Result<T, NephrolensError>;

/// Main error type for Nephrolens
#[derive(Debug, thiserror::Error)]
pub enum NephrolensError {
    #[error(transparent)]
    Egfr(#[from] domain::EgfrError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Record import failed: {0}")]
    Import(#[from] adapters::ImportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<std::convert::Infallible> for NephrolensError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
