//! Calculation engine: normalize -> estimate -> classify.
//!
//! The engine holds only the MDRD constant set. It is `Copy` and has no
//! interior state, so one instance can be shared freely across threads.

use crate::domain::{
    classify_for, EgfrError, EgfrResult, Estimator, MdrdCoefficients, Measurement, PatientRecord,
    Subject,
};

/// Stateless eGFR calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EgfrEngine {
    estimator: Estimator,
}

impl EgfrEngine {
    #[must_use]
    pub fn new(coefficients: MdrdCoefficients) -> Self {
        Self {
            estimator: Estimator::new(coefficients),
        }
    }

    #[must_use]
    pub fn coefficients(&self) -> MdrdCoefficients {
        self.estimator.coefficients()
    }

    /// Estimate and classify one typed input.
    ///
    /// The recommendation table follows the subject's population, so a
    /// child in stage 3 gets pediatric guidance.
    ///
    /// # Errors
    /// Any guard failure from [`Estimator::estimate`].
    pub fn calculate(
        &self,
        subject: &Subject,
        creatinine: &Measurement,
    ) -> Result<EgfrResult, EgfrError> {
        let estimate = self.estimator.estimate(subject, creatinine.mg_per_dl())?;
        let classification = classify_for(estimate.rate, subject.population());

        Ok(EgfrResult {
            rate: estimate.rate,
            stage: classification.stage,
            recommendation: classification.recommendation,
            equation: estimate.equation,
        })
    }

    /// Parse a raw record and calculate it.
    ///
    /// # Errors
    /// The first parse or validation failure, else any calculation failure.
    pub fn calculate_record(&self, record: &PatientRecord) -> Result<EgfrResult, EgfrError> {
        let (subject, creatinine) = record.parse()?;
        self.calculate(&subject, &creatinine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{normalize, CkdStage, Equation, Ethnicity, Gender};

    fn record(age: &str, gender: &str, creatinine: &str, unit: &str) -> PatientRecord {
        PatientRecord {
            age: age.to_string(),
            gender: gender.to_string(),
            ethnicity: Some("non-black".to_string()),
            creatinine: creatinine.to_string(),
            unit: unit.to_string(),
            ..PatientRecord::default()
        }
    }

    #[test]
    fn test_adult_calculation() {
        let engine = EgfrEngine::default();
        let subject = Subject::adult(40.0, Gender::Male, Ethnicity::NonBlack);
        let creatinine = normalize(1.0, "mg/dL").expect("Should normalize");

        let result = engine
            .calculate(&subject, &creatinine)
            .expect("Should calculate");
        assert_eq!(result.rate, 87.96);
        assert_eq!(result.stage, CkdStage::G2);
        assert_eq!(result.equation, Equation::Mdrd);
        assert_eq!(
            result.recommendation,
            "Monitor kidney function bi-annually. Control blood pressure."
        );
    }

    #[test]
    fn test_pediatric_uses_pediatric_table() {
        let engine = EgfrEngine::default();
        let child = Subject::pediatric(10.0, 120.0, Gender::Female);
        let creatinine = normalize(0.5, "mg/dL").expect("Should normalize");

        let result = engine.calculate(&child, &creatinine).expect("Should calculate");
        assert_eq!(result.rate, 99.12);
        assert_eq!(result.equation, Equation::BedsideSchwartz);

        let adult_text = crate::domain::classify(result.rate).recommendation;
        assert_ne!(result.recommendation, adult_text);
    }

    #[test]
    fn test_idms_coefficients() {
        let engine = EgfrEngine::new(MdrdCoefficients::IDMS);
        let subject = Subject::adult(40.0, Gender::Male, Ethnicity::NonBlack);
        let creatinine = normalize(1.0, "mg/dL").expect("Should normalize");
        let result = engine
            .calculate(&subject, &creatinine)
            .expect("Should calculate");
        assert_eq!(result.rate, 82.76);
        assert_eq!(engine.coefficients(), MdrdCoefficients::IDMS);
    }

    #[test]
    fn test_record_unit_conversion_matches_mg_dl() {
        let engine = EgfrEngine::default();
        let mg = engine
            .calculate_record(&record("55", "female", "1.2", "mg/dL"))
            .expect("Should calculate");
        let micromol = engine
            .calculate_record(&record("55", "female", "106.08", "µmol/L"))
            .expect("Should calculate");
        assert_eq!(mg.rate, micromol.rate);
    }

    #[test]
    fn test_record_errors_surface() {
        let engine = EgfrEngine::default();
        let err = engine
            .calculate_record(&record("40", "male", "1.0", "lbs"))
            .expect_err("Should reject unit");
        assert_eq!(err, EgfrError::InvalidUnit("lbs".to_string()));

        let err = engine
            .calculate_record(&record("40", "male", "abc", "mg/dL"))
            .expect_err("Should reject value");
        assert_eq!(err.kind(), "invalid_value");
    }
}
