//! JSON record file adapter: Implementation of RecordSource.
//!
//! A record file is a JSON array of flat objects, one per patient row.
//! Header keys are trimmed, lower-cased and have spaces or dashes folded to
//! underscores before lookup. Values may be strings or numbers.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::domain::PatientRecord;
use crate::ports::RecordSource;

/// Error type for record import.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON array of records, found {0}")]
    NotAnArray(&'static str),
}

const REF_KEYS: &[&str] = &["patient_id", "patient_ref", "id"];
const AGE_KEYS: &[&str] = &["age"];
const GENDER_KEYS: &[&str] = &["gender", "sex"];
const ETHNICITY_KEYS: &[&str] = &["ethnicity", "race"];
const CREATININE_KEYS: &[&str] = &["creatinine", "serum_creatinine", "scr"];
const UNIT_KEYS: &[&str] = &["unit", "units", "creatinine_unit"];
const HEIGHT_KEYS: &[&str] = &["height_cm", "height"];

/// Records stored in a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonRecordFile {
    path: PathBuf,
}

impl JsonRecordFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonRecordFile {
    type Error = ImportError;

    fn describe(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    fn load(&self) -> Result<Vec<PatientRecord>, Self::Error> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| ImportError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_records(&text)
    }
}

/// Parse the text of a record file.
///
/// An element that is not an object yields an empty record, which then fails
/// on its own row instead of rejecting the whole file.
///
/// # Errors
/// Returns error if the text is not JSON or the top level is not an array.
pub fn parse_records(text: &str) -> Result<Vec<PatientRecord>, ImportError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(rows) = value else {
        return Err(ImportError::NotAnArray(json_kind(&value)));
    };

    Ok(rows
        .iter()
        .map(|row| match row {
            Value::Object(fields) => record_from_object(fields),
            _ => PatientRecord::default(),
        })
        .collect())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace([' ', '-'], "_")
}

fn cell(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        other => Some(other.to_string()),
    }
}

fn record_from_object(fields: &Map<String, Value>) -> PatientRecord {
    let normalized: Vec<(String, &Value)> =
        fields.iter().map(|(k, v)| (normalize_key(k), v)).collect();

    let lookup = |aliases: &[&str]| -> Option<String> {
        aliases.iter().find_map(|alias| {
            normalized
                .iter()
                .find(|(k, _)| k.as_str() == *alias)
                .and_then(|(_, v)| cell(v))
        })
    };

    PatientRecord {
        patient_ref: lookup(REF_KEYS),
        age: lookup(AGE_KEYS).unwrap_or_default(),
        gender: lookup(GENDER_KEYS).unwrap_or_default(),
        ethnicity: lookup(ETHNICITY_KEYS),
        creatinine: lookup(CREATININE_KEYS).unwrap_or_default(),
        unit: lookup(UNIT_KEYS).unwrap_or_default(),
        height: lookup(HEIGHT_KEYS),
    }
}
