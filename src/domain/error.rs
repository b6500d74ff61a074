//! Errors produced by the eGFR estimation engine.
//!
//! Every failure is returned to the caller as a value. None of these are
//! fatal to the process; in batch mode they are attached to the failing row.

/// Typed failure of a single calculation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EgfrError {
    /// Creatinine unit label is not one of the recognized spellings.
    #[error("Unrecognized creatinine unit: {0:?}")]
    InvalidUnit(String),

    /// A field could not be parsed or is outside its physiological range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// A field required on this path was not supplied.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Numeric guard failed after normalization.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A stage number outside 1..=5 reached the recommendation lookup.
    #[error("CKD stage {0} is outside 1..=5")]
    StageOutOfRange(u8),
}

impl EgfrError {
    pub(crate) fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-friendly kind, used in logs and batch summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidUnit(_) => "invalid_unit",
            Self::InvalidValue { .. } => "invalid_value",
            Self::MissingField(_) => "missing_field",
            Self::InvalidInput(_) => "invalid_input",
            Self::StageOutOfRange(_) => "stage_out_of_range",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EgfrError::InvalidUnit("lbs".to_string());
        assert_eq!(err.to_string(), "Unrecognized creatinine unit: \"lbs\"");

        let err = EgfrError::invalid_value("age", "not a number");
        assert_eq!(err.to_string(), "Invalid value for age: not a number");
        assert_eq!(err.kind(), "invalid_value");

        assert_eq!(EgfrError::MissingField("height_cm").kind(), "missing_field");
    }
}
