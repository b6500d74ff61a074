//! Domain layer: Core kidney-function types and logic.
//!
//! Everything here is pure and deterministic: no I/O, no shared state.
//! The pipeline is normalize (`measurement`) -> estimate (`equation`)
//! -> classify (`staging`).

mod calculation;
pub mod equation;
mod error;
mod measurement;
mod record;
pub mod staging;
mod subject;

pub use calculation::{Calculation, EgfrResult, UserMode};
pub use equation::{estimate, Equation, Estimate, Estimator, MdrdCoefficients};
pub use error::EgfrError;
pub use measurement::{normalize, CreatinineUnit, Measurement, RawValue, MICROMOL_PER_MG_DL};
pub use record::PatientRecord;
pub use staging::{classify, classify_for, CkdStage, Classification};
pub use subject::{Ethnicity, Gender, Population, Subject, ADULT_AGE_YEARS};
