//! Raw patient record as produced by the form or a record source.
//!
//! Field names are already normalized by the producer; values are kept as
//! text so that each one can be reported individually when it is malformed.

use serde::{Deserialize, Serialize};

use super::subject::MAX_AGE_YEARS;
use super::{normalize, EgfrError, Ethnicity, Gender, Measurement, Population, Subject};

/// One input row. Optional fields are `None` when the column is absent or blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Caller-side reference (chart number, row label). Never used in the calculation.
    pub patient_ref: Option<String>,
    pub age: String,
    pub gender: String,
    pub ethnicity: Option<String>,
    pub creatinine: String,
    pub unit: String,
    pub height: Option<String>,
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, EgfrError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(EgfrError::MissingField(field));
    }
    let value: f64 = s
        .parse()
        .map_err(|_| EgfrError::invalid_value(field, format!("{s:?} is not a number")))?;
    if !value.is_finite() {
        return Err(EgfrError::invalid_value(field, "not a finite number"));
    }
    Ok(value)
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl PatientRecord {
    /// Parse and validate into the engine's typed inputs.
    ///
    /// Ethnicity is only read for adults and height only for children, so a
    /// malformed value in the unused column does not fail the record.
    ///
    /// # Errors
    /// The first field that fails, in column order.
    pub fn parse(&self) -> Result<(Subject, Measurement), EgfrError> {
        let age = parse_number("age", &self.age)?;
        if !(0.0..=MAX_AGE_YEARS).contains(&age) {
            return Err(EgfrError::invalid_value(
                "age",
                format!("{age} out of range [0, {MAX_AGE_YEARS}]"),
            ));
        }
        let gender: Gender = self.gender.parse()?;

        let subject = match Population::for_age(age) {
            Population::Adult => {
                let ethnicity: Ethnicity = present(&self.ethnicity)
                    .ok_or(EgfrError::MissingField("ethnicity"))?
                    .parse()?;
                Subject::adult(age, gender, ethnicity)
            }
            Population::Pediatric => {
                let height = present(&self.height).ok_or(EgfrError::MissingField("height_cm"))?;
                Subject::pediatric(age, parse_number("height_cm", height)?, gender)
            }
        };
        subject.validate()?;

        let measurement = normalize(self.creatinine.as_str(), &self.unit)?;
        Ok((subject, measurement))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CreatinineUnit;

    fn adult_record() -> PatientRecord {
        PatientRecord {
            patient_ref: Some("row-1".to_string()),
            age: "40".to_string(),
            gender: "male".to_string(),
            ethnicity: Some("non-african".to_string()),
            creatinine: "1.0".to_string(),
            unit: "mg/dL".to_string(),
            height: None,
        }
    }

    #[test]
    fn test_parse_adult() {
        let (subject, m) = adult_record().parse().expect("Should parse");
        assert_eq!(subject.population(), Population::Adult);
        assert_eq!(subject.ethnicity, Some(Ethnicity::NonBlack));
        assert_eq!(m.unit, CreatinineUnit::MgPerDl);
    }

    #[test]
    fn test_parse_pediatric_requires_height() {
        let mut record = PatientRecord {
            age: "10".to_string(),
            ethnicity: None,
            ..adult_record()
        };
        assert_eq!(record.parse(), Err(EgfrError::MissingField("height_cm")));

        record.height = Some("  ".to_string());
        assert_eq!(record.parse(), Err(EgfrError::MissingField("height_cm")));

        record.height = Some("120".to_string());
        let (subject, _) = record.parse().expect("Should parse");
        assert_eq!(subject.height_cm, Some(120.0));
    }

    #[test]
    fn test_unused_columns_ignored() {
        let child = PatientRecord {
            age: "9".to_string(),
            ethnicity: Some("???".to_string()),
            height: Some("130".to_string()),
            ..adult_record()
        };
        assert!(child.parse().is_ok());

        let grown = PatientRecord {
            height: Some("tall".to_string()),
            ..adult_record()
        };
        assert!(grown.parse().is_ok());
    }

    #[test]
    fn test_field_errors() {
        let bad_age = PatientRecord {
            age: "forty".to_string(),
            ..adult_record()
        };
        assert!(matches!(
            bad_age.parse(),
            Err(EgfrError::InvalidValue { field: "age", .. })
        ));

        let bad_creatinine = PatientRecord {
            creatinine: "high".to_string(),
            ..adult_record()
        };
        assert!(matches!(
            bad_creatinine.parse(),
            Err(EgfrError::InvalidValue { field: "creatinine", .. })
        ));

        let bad_unit = PatientRecord {
            unit: "lbs".to_string(),
            ..adult_record()
        };
        assert!(matches!(bad_unit.parse(), Err(EgfrError::InvalidUnit(_))));

        let old = PatientRecord {
            age: "130".to_string(),
            ..adult_record()
        };
        assert!(matches!(
            old.parse(),
            Err(EgfrError::InvalidValue { field: "age", .. })
        ));
    }
}
