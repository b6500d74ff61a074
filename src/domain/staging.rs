//! CKD stage classification and recommendations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EgfrError, Population};

/// CKD stage by GFR category, G1 (normal) to G5 (kidney failure).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CkdStage {
    G1 = 1,
    G2 = 2,
    G3 = 3,
    G4 = 4,
    G5 = 5,
}

impl CkdStage {
    pub const ALL: [Self; 5] = [Self::G1, Self::G2, Self::G3, Self::G4, Self::G5];

    /// Stage for an eGFR value. Bands are closed at the bottom, checked from
    /// stage 1 downwards.
    #[must_use]
    pub fn from_rate(egfr: f64) -> Self {
        if egfr >= 90.0 {
            Self::G1
        } else if egfr >= 60.0 {
            Self::G2
        } else if egfr >= 30.0 {
            Self::G3
        } else if egfr >= 15.0 {
            Self::G4
        } else {
            Self::G5
        }
    }

    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }

    /// Short clinical label for the band.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::G1 => "Normal or high",
            Self::G2 => "Mildly decreased",
            Self::G3 => "Moderately decreased",
            Self::G4 => "Severely decreased",
            Self::G5 => "Kidney failure",
        }
    }
}

impl TryFrom<u8> for CkdStage {
    type Error = EgfrError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(Self::G1),
            2 => Ok(Self::G2),
            3 => Ok(Self::G3),
            4 => Ok(Self::G4),
            5 => Ok(Self::G5),
            other => Err(EgfrError::StageOutOfRange(other)),
        }
    }
}

impl From<CkdStage> for u8 {
    fn from(stage: CkdStage) -> Self {
        stage.number()
    }
}

impl fmt::Display for CkdStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage {}", self.number())
    }
}

/// Recommendation text for a stage.
#[must_use]
pub fn recommendation(stage: CkdStage, population: Population) -> &'static str {
    match population {
        Population::Adult => match stage {
            CkdStage::G1 => "Monitor kidney function annually. Maintain healthy lifestyle.",
            CkdStage::G2 => "Monitor kidney function bi-annually. Control blood pressure.",
            CkdStage::G3 => "Consult nephrologist. Monitor every 3-6 months.",
            CkdStage::G4 => "Regular nephrologist visits. Prepare for possible kidney replacement.",
            CkdStage::G5 => "Immediate medical attention required. Discuss treatment options.",
        },
        Population::Pediatric => match stage {
            CkdStage::G1 => {
                "Check kidney function at routine visits. Track growth and blood pressure."
            }
            CkdStage::G2 => {
                "Recheck kidney function every 6 months with the pediatrician. Track growth and blood pressure."
            }
            CkdStage::G3 => {
                "Refer to a pediatric nephrologist. Monitor growth, nutrition and labs every 3-6 months."
            }
            CkdStage::G4 => {
                "Follow closely with pediatric nephrology. Begin family education on kidney replacement options."
            }
            CkdStage::G5 => {
                "Urgent pediatric nephrology care required. Plan dialysis or transplant with the care team."
            }
        },
    }
}

/// Recommendation by raw stage number. Only reachable with a number that did
/// not come from [`CkdStage::from_rate`].
///
/// # Errors
/// `StageOutOfRange` for numbers outside 1..=5.
pub fn recommendation_for_number(stage: u8, population: Population) -> Result<&'static str, EgfrError> {
    CkdStage::try_from(stage).map(|s| recommendation(s, population))
}

/// Stage plus its recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub stage: CkdStage,
    pub recommendation: String,
}

/// Classify an eGFR with the adult recommendation table.
#[must_use]
pub fn classify(egfr: f64) -> Classification {
    classify_for(egfr, Population::Adult)
}

/// Classify an eGFR with the table for `population`.
#[must_use]
pub fn classify_for(egfr: f64, population: Population) -> Classification {
    let stage = CkdStage::from_rate(egfr);
    Classification {
        stage,
        recommendation: recommendation(stage, population).to_string(),
    }
}
