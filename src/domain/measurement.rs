//! Serum creatinine measurement and unit normalization.
//!
//! Laboratories report creatinine either in mg/dL or in µmol/L. The
//! equations are defined on mg/dL, so every measurement carries its
//! canonical unit and converts on demand (1 mg/dL = 88.4 µmol/L).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EgfrError;

/// µmol/L per mg/dL for creatinine.
pub const MICROMOL_PER_MG_DL: f64 = 88.4;

/// Spellings accepted for mg/dL, after lower-casing and whitespace removal.
const MG_DL_ALIASES: &[&str] = &["mg/dl", "mgdl", "mgs/dl"];

/// Spellings accepted for µmol/L. Includes the micro sign (U+00B5), the
/// Greek mu (U+03BC) and encoding-corrupted forms seen in exported sheets.
const MICROMOL_L_ALIASES: &[&str] = &[
    "micromol/l",
    "micromoll",
    "micromol",
    "µmol/l",
    "μmol/l",
    "umol/l",
    "umol",
    "m/l",
    "âµmol/l",
    "\u{fffd}mol/l",
    "?mol/l",
];

/// Canonical creatinine units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreatinineUnit {
    #[serde(rename = "mg/dL")]
    MgPerDl,
    #[serde(rename = "micromol/L")]
    MicromolPerL,
}

impl CreatinineUnit {
    /// Canonical label used for display and storage.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::MgPerDl => "mg/dL",
            Self::MicromolPerL => "micromol/L",
        }
    }
}

impl fmt::Display for CreatinineUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CreatinineUnit {
    type Err = EgfrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if MG_DL_ALIASES.contains(&key.as_str()) {
            Ok(Self::MgPerDl)
        } else if MICROMOL_L_ALIASES.contains(&key.as_str()) {
            Ok(Self::MicromolPerL)
        } else {
            Err(EgfrError::InvalidUnit(raw.to_string()))
        }
    }
}

/// A raw creatinine value as handed over by a form or record source.
#[derive(Debug, Clone, Copy)]
pub enum RawValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl<'a> From<&'a str> for RawValue<'a> {
    fn from(s: &'a str) -> Self {
        Self::Text(s)
    }
}

impl<'a> From<&'a String> for RawValue<'a> {
    fn from(s: &'a String) -> Self {
        Self::Text(s.as_str())
    }
}

impl From<f64> for RawValue<'_> {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

/// A validated creatinine measurement. `value` is strictly positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub unit: CreatinineUnit,
}

impl Measurement {
    /// Build a measurement from an already-typed value and unit.
    ///
    /// # Errors
    /// Returns `InvalidValue` if the value is not finite or not positive.
    pub fn new(value: f64, unit: CreatinineUnit) -> Result<Self, EgfrError> {
        if !value.is_finite() {
            return Err(EgfrError::invalid_value("creatinine", "not a finite number"));
        }
        if value <= 0.0 {
            return Err(EgfrError::invalid_value(
                "creatinine",
                format!("{value} must be greater than zero"),
            ));
        }
        Ok(Self { value, unit })
    }

    /// Creatinine expressed in mg/dL, the unit the equations are defined on.
    #[must_use]
    pub fn mg_per_dl(&self) -> f64 {
        match self.unit {
            CreatinineUnit::MgPerDl => self.value,
            CreatinineUnit::MicromolPerL => self.value / MICROMOL_PER_MG_DL,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Normalize a raw creatinine value and unit label into a [`Measurement`].
///
/// The unit is checked first so that an unknown unit is reported even when
/// the value is also malformed.
///
/// # Errors
/// `InvalidUnit` for an unrecognized label, `MissingField` for an empty
/// value, `InvalidValue` for a non-numeric, non-finite or non-positive value.
pub fn normalize<'a>(
    raw_value: impl Into<RawValue<'a>>,
    raw_unit: &str,
) -> Result<Measurement, EgfrError> {
    let unit: CreatinineUnit = raw_unit.parse()?;

    let value = match raw_value.into() {
        RawValue::Number(v) => v,
        RawValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(EgfrError::MissingField("creatinine"));
            }
            s.parse::<f64>().map_err(|_| {
                EgfrError::invalid_value("creatinine", format!("{s:?} is not a number"))
            })?
        }
    };

    Measurement::new(value, unit)
}
