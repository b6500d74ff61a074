//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod batch;
mod engine;
mod service;

pub use batch::{
    process_batch, process_batch_with, process_batch_with_progress, BatchReport, CalculatedRow,
    RowOutcome,
};
pub use engine::EgfrEngine;
pub use service::{CalculationService, StageSummary};
