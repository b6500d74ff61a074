//! Record source port: where batch records come from.
//!
//! Implementations own file formats and header-name normalization; they hand
//! the application typed [`PatientRecord`]s in source order.

use crate::domain::PatientRecord;

/// Producer of records for batch calculation.
pub trait RecordSource {
    /// Error type for loading records.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Short description of the source (file name, upload label) for logs.
    fn describe(&self) -> String;

    /// Load every record in source order.
    ///
    /// A malformed individual row is still returned as a record; the engine
    /// reports it per row. Only failures that prevent reading the source as a
    /// whole are errors here.
    ///
    /// # Errors
    /// Returns error if the source cannot be read or is not a record set.
    fn load(&self) -> Result<Vec<PatientRecord>, Self::Error>;
}

impl RecordSource for Vec<PatientRecord> {
    type Error = std::convert::Infallible;

    fn describe(&self) -> String {
        format!("{} in-memory records", self.len())
    }

    fn load(&self) -> Result<Vec<PatientRecord>, Self::Error> {
        Ok(self.clone())
    }
}
