//! Equation selection and evaluation.
//!
//! Adults (18 and over) use the four-variable MDRD study equation:
//!
//! ```text
//! eGFR = K * Scr^-1.154 * age^-0.203 * 0.742 [female] * E [black]
//! ```
//!
//! Children use the bedside Schwartz equation:
//!
//! ```text
//! eGFR = 0.413 * height_cm / Scr
//! ```
//!
//! `Scr` is serum creatinine in mg/dL. Results are reported in
//! mL/min/1.73m² rounded half-up to two decimals.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EgfrError, Ethnicity, Gender, Population, Subject};

pub const CREATININE_EXPONENT: f64 = -1.154;
pub const AGE_EXPONENT: f64 = -0.203;
pub const FEMALE_FACTOR: f64 = 0.742;
pub const SCHWARTZ_CONSTANT: f64 = 0.413;

/// MDRD constant set. K and the ethnicity multiplier are published as a
/// pair and must not be mixed across conventions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MdrdCoefficients {
    /// Leading constant K
    pub k: f64,
    /// Multiplier applied for black ethnicity
    pub black_factor: f64,
}

impl MdrdCoefficients {
    /// Original MDRD study calibration (K = 186, ×1.210).
    pub const ORIGINAL: Self = Self {
        k: 186.0,
        black_factor: 1.210,
    };

    /// IDMS-traceable re-expression (K = 175, ×1.212).
    pub const IDMS: Self = Self {
        k: 175.0,
        black_factor: 1.212,
    };

    /// Short name used in configuration and logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        if *self == Self::IDMS {
            "idms"
        } else if *self == Self::ORIGINAL {
            "original"
        } else {
            "custom"
        }
    }
}

impl Default for MdrdCoefficients {
    fn default() -> Self {
        Self::ORIGINAL
    }
}

/// Equation that produced an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equation {
    Mdrd,
    BedsideSchwartz,
}

impl Equation {
    #[must_use]
    pub fn for_population(population: Population) -> Self {
        match population {
            Population::Adult => Self::Mdrd,
            Population::Pediatric => Self::BedsideSchwartz,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mdrd => "mdrd",
            Self::BedsideSchwartz => "bedside_schwartz",
        }
    }
}

impl fmt::Display for Equation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mdrd => write!(f, "MDRD"),
            Self::BedsideSchwartz => write!(f, "Bedside Schwartz"),
        }
    }
}

/// Rounded estimate together with the equation used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// mL/min/1.73m², two decimals
    pub rate: f64,
    pub equation: Equation,
}

/// Round half-up to `decimals` places. Inputs here are always positive, where
/// `f64::round` (half away from zero) is half-up.
///
/// The scaled value is snapped to six fractional digits first so a decimal
/// tie such as 72.275 (stored as 72.27499999...) still rounds up.
#[must_use]
pub fn round_half_up(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let scaled = ((value * scale) * SNAP).round() / SNAP;
    scaled.round() / scale
}

const SNAP: f64 = 1e6;

/// Stateless evaluator parameterized by the MDRD constant set.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Estimator {
    coefficients: MdrdCoefficients,
}

impl Estimator {
    #[must_use]
    pub fn new(coefficients: MdrdCoefficients) -> Self {
        Self { coefficients }
    }

    #[must_use]
    pub fn coefficients(&self) -> MdrdCoefficients {
        self.coefficients
    }

    /// Select the equation for the subject's age and evaluate it.
    ///
    /// # Errors
    /// `InvalidInput` for non-positive creatinine, non-finite or negative
    /// age, or a non-positive pediatric height. `MissingField` when the
    /// pediatric height or adult ethnicity is absent.
    pub fn estimate(&self, subject: &Subject, creatinine_mg_dl: f64) -> Result<Estimate, EgfrError> {
        if !creatinine_mg_dl.is_finite() || creatinine_mg_dl <= 0.0 {
            return Err(EgfrError::InvalidInput(format!(
                "creatinine must be a positive mg/dL value, got {creatinine_mg_dl}"
            )));
        }
        if !subject.age.is_finite() || subject.age < 0.0 {
            return Err(EgfrError::InvalidInput(format!(
                "age must be a non-negative number of years, got {}",
                subject.age
            )));
        }

        let population = subject.population();
        let raw = match population {
            Population::Adult => self.mdrd(subject, creatinine_mg_dl)?,
            Population::Pediatric => Self::bedside_schwartz(subject, creatinine_mg_dl)?,
        };

        Ok(Estimate {
            rate: round_half_up(raw, 2),
            equation: Equation::for_population(population),
        })
    }

    fn mdrd(&self, subject: &Subject, creatinine_mg_dl: f64) -> Result<f64, EgfrError> {
        let ethnicity = subject.ethnicity.ok_or(EgfrError::MissingField("ethnicity"))?;

        let base = self.coefficients.k
            * creatinine_mg_dl.powf(CREATININE_EXPONENT)
            * subject.age.powf(AGE_EXPONENT);

        // Gender and ethnicity collapse into one factor; a two-operand
        // product is exactly commutative.
        let gender_factor = match subject.gender {
            Gender::Female => FEMALE_FACTOR,
            Gender::Male => 1.0,
        };
        let ethnicity_factor = match ethnicity {
            Ethnicity::Black => self.coefficients.black_factor,
            Ethnicity::NonBlack => 1.0,
        };

        Ok(base * (gender_factor * ethnicity_factor))
    }

    fn bedside_schwartz(subject: &Subject, creatinine_mg_dl: f64) -> Result<f64, EgfrError> {
        let height = subject.height_cm.ok_or(EgfrError::MissingField("height_cm"))?;
        if !height.is_finite() || height <= 0.0 {
            return Err(EgfrError::InvalidInput(format!(
                "height must be a positive number of centimetres, got {height}"
            )));
        }
        Ok(SCHWARTZ_CONSTANT * height / creatinine_mg_dl)
    }
}

/// Estimate eGFR with the default (original MDRD) constant set.
///
/// # Errors
/// See [`Estimator::estimate`].
pub fn estimate(subject: &Subject, creatinine_mg_dl: f64) -> Result<f64, EgfrError> {
    Estimator::default()
        .estimate(subject, creatinine_mg_dl)
        .map(|e| e.rate)
}
