//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (storage, record files).

mod records;
mod storage;

pub use records::RecordSource;
pub use storage::{CalculationPage, Storage};
