//! Calculation results and the persisted calculation record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{CkdStage, Equation, Measurement, Subject};

/// Outcome of one eGFR calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EgfrResult {
    /// mL/min/1.73m², rounded to 2 decimals
    pub rate: f64,

    pub stage: CkdStage,

    pub recommendation: String,

    /// Equation the rate was computed with
    pub equation: Equation,
}

/// Who entered the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserMode {
    #[default]
    Patient,
    Clinician,
}

impl UserMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Patient => Self::Clinician,
            Self::Clinician => Self::Patient,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::Clinician => "clinician",
        }
    }
}

impl fmt::Display for UserMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patient => write!(f, "Patient"),
            Self::Clinician => write!(f, "Clinician"),
        }
    }
}

/// Stored calculation: inputs as normalized, result, and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    /// Unique identifier
    pub id: String,

    /// Caller-side reference, if one was supplied
    pub patient_ref: Option<String>,

    pub mode: UserMode,

    pub subject: Subject,

    pub creatinine: Measurement,

    pub result: EgfrResult,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Calculation {
    #[must_use]
    pub fn new(
        subject: Subject,
        creatinine: Measurement,
        result: EgfrResult,
        mode: UserMode,
    ) -> Self {
        Self {
            id: uuid_v4(),
            patient_ref: None,
            mode,
            subject,
            creatinine,
            result,
            created_at: chrono::Utc::now(),
        }
    }

    #[must_use]
    pub fn with_patient_ref(mut self, patient_ref: Option<String>) -> Self {
        self.patient_ref = patient_ref;
        self
    }
}

/// Random (v4) UUID from a ChaCha20 generator seeded by the OS.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let mut bytes: [u8; 16] = rng.gen();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{normalize, Ethnicity, Gender};

    fn sample() -> Calculation {
        let subject = Subject::adult(40.0, Gender::Male, Ethnicity::NonBlack);
        let creatinine = normalize("1.0", "mg/dL").expect("Should normalize");
        let result = EgfrResult {
            rate: 87.96,
            stage: CkdStage::G2,
            recommendation: "r".to_string(),
            equation: Equation::Mdrd,
        };
        Calculation::new(subject, creatinine, result, UserMode::Patient)
    }

    #[test]
    fn test_calculation_creation() {
        let calc = sample().with_patient_ref(Some("MRN-1".to_string()));
        assert_eq!(calc.patient_ref.as_deref(), Some("MRN-1"));
        assert_eq!(calc.mode, UserMode::Patient);
        assert_eq!(calc.result.stage, CkdStage::G2);
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
        assert_eq!(&id1[14..15], "4");
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(UserMode::Patient.toggled(), UserMode::Clinician);
        assert_eq!(UserMode::Clinician.toggled(), UserMode::Patient);
    }

    #[test]
    fn test_serde_round_trip_keeps_stage_number() {
        let calc = sample();
        let json = serde_json::to_string(&calc).expect("Should serialize");
        assert!(json.contains("\"stage\":2"));
        let back: Calculation = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(back.id, calc.id);
        assert_eq!(back.result.stage, CkdStage::G2);
        assert_eq!(back.subject.ethnicity, Some(Ethnicity::NonBlack));
    }
}
