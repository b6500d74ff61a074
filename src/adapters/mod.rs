//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `sqlite`: SQLite for local storage
//! - `json_records`: serde_json record files for batch import
//! - `redact`: identifier and lab-value filtering for logs

pub mod json_records;
pub mod redact;
pub mod sqlite;

pub use json_records::{ImportError, JsonRecordFile};
pub use sqlite::{SqliteStorage, StorageError};
