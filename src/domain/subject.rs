//! The person an eGFR is estimated for.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::EgfrError;

/// Age (years) at which the adult equation takes over.
pub const ADULT_AGE_YEARS: f64 = 18.0;

/// Oldest plausible age accepted from a form or record.
pub const MAX_AGE_YEARS: f64 = 120.0;

/// Exclusive lower bound for pediatric height in centimetres.
pub const MIN_HEIGHT_CM: f64 = 30.0;

/// Inclusive upper bound for pediatric height in centimetres.
pub const MAX_HEIGHT_CM: f64 = 200.0;

fn normalize_label(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['_', ' '], "-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = EgfrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_label(raw).as_str() {
            "male" | "m" | "man" => Ok(Self::Male),
            "female" | "f" | "woman" => Ok(Self::Female),
            "" => Err(EgfrError::MissingField("gender")),
            other => Err(EgfrError::invalid_value(
                "gender",
                format!("{other:?} is not male or female"),
            )),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Male => write!(f, "male"),
            Self::Female => write!(f, "female"),
        }
    }
}

/// Ethnicity as used by the MDRD adjustment. Only consulted for adults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ethnicity {
    Black,
    NonBlack,
}

impl FromStr for Ethnicity {
    type Err = EgfrError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match normalize_label(raw).as_str() {
            "black" | "african" | "african-american" | "b" => Ok(Self::Black),
            "non-black" | "nonblack" | "non-african" | "other" | "white" | "asian"
            | "hispanic" | "n" => Ok(Self::NonBlack),
            "" => Err(EgfrError::MissingField("ethnicity")),
            other => Err(EgfrError::invalid_value(
                "ethnicity",
                format!("{other:?} is not a recognized ethnicity"),
            )),
        }
    }
}

impl fmt::Display for Ethnicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Black => write!(f, "black"),
            Self::NonBlack => write!(f, "non-black"),
        }
    }
}

/// Which equation family and recommendation table apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Population {
    Adult,
    Pediatric,
}

impl Population {
    #[must_use]
    pub fn for_age(age: f64) -> Self {
        if age >= ADULT_AGE_YEARS {
            Self::Adult
        } else {
            Self::Pediatric
        }
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adult => write!(f, "adult"),
            Self::Pediatric => write!(f, "pediatric"),
        }
    }
}

/// Demographics required by the equations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Age in years
    pub age: f64,

    /// Height in centimetres; required below 18 years
    pub height_cm: Option<f64>,

    pub gender: Gender,

    /// Required for adults, ignored below 18 years
    pub ethnicity: Option<Ethnicity>,
}

impl Subject {
    /// Adult subject (ethnicity supplied).
    #[must_use]
    pub fn adult(age: f64, gender: Gender, ethnicity: Ethnicity) -> Self {
        Self {
            age,
            height_cm: None,
            gender,
            ethnicity: Some(ethnicity),
        }
    }

    /// Pediatric subject (height supplied).
    #[must_use]
    pub fn pediatric(age: f64, height_cm: f64, gender: Gender) -> Self {
        Self {
            age,
            height_cm: Some(height_cm),
            gender,
            ethnicity: None,
        }
    }

    #[must_use]
    pub fn population(&self) -> Population {
        Population::for_age(self.age)
    }

    /// Check plausibility of the demographics for the path this subject takes.
    ///
    /// # Errors
    /// `InvalidValue` for out-of-range age or height, `MissingField` when the
    /// path-specific field is absent.
    pub fn validate(&self) -> Result<(), EgfrError> {
        if !self.age.is_finite() || !(0.0..=MAX_AGE_YEARS).contains(&self.age) {
            return Err(EgfrError::invalid_value(
                "age",
                format!("{} out of range [0, {MAX_AGE_YEARS}]", self.age),
            ));
        }

        match self.population() {
            Population::Pediatric => {
                let height = self.height_cm.ok_or(EgfrError::MissingField("height_cm"))?;
                if !height.is_finite() || height <= MIN_HEIGHT_CM || height > MAX_HEIGHT_CM {
                    return Err(EgfrError::invalid_value(
                        "height_cm",
                        format!("{height} out of range ({MIN_HEIGHT_CM}, {MAX_HEIGHT_CM}]"),
                    ));
                }
            }
            Population::Adult => {
                if self.ethnicity.is_none() {
                    return Err(EgfrError::MissingField("ethnicity"));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parsing() {
        assert_eq!("Male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!(" f ".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("".parse::<Gender>(), Err(EgfrError::MissingField("gender")));
        assert!(matches!(
            "unknown".parse::<Gender>(),
            Err(EgfrError::InvalidValue { field: "gender", .. })
        ));
    }

    #[test]
    fn test_ethnicity_parsing() {
        assert_eq!("African".parse::<Ethnicity>(), Ok(Ethnicity::Black));
        assert_eq!("african american".parse::<Ethnicity>(), Ok(Ethnicity::Black));
        assert_eq!("non-african".parse::<Ethnicity>(), Ok(Ethnicity::NonBlack));
        assert_eq!("Non Black".parse::<Ethnicity>(), Ok(Ethnicity::NonBlack));
    }

    #[test]
    fn test_population_boundary() {
        assert_eq!(Population::for_age(17.99), Population::Pediatric);
        assert_eq!(Population::for_age(18.0), Population::Adult);
        assert_eq!(Population::for_age(0.0), Population::Pediatric);
    }

    #[test]
    fn test_validation() {
        assert!(Subject::adult(40.0, Gender::Male, Ethnicity::NonBlack)
            .validate()
            .is_ok());
        assert!(Subject::pediatric(10.0, 120.0, Gender::Female).validate().is_ok());
        assert!(Subject::pediatric(10.0, 200.0, Gender::Female).validate().is_ok());

        let too_short = Subject::pediatric(10.0, 30.0, Gender::Female);
        assert!(matches!(
            too_short.validate(),
            Err(EgfrError::InvalidValue { field: "height_cm", .. })
        ));

        let no_height = Subject {
            height_cm: None,
            ..Subject::pediatric(10.0, 120.0, Gender::Male)
        };
        assert_eq!(no_height.validate(), Err(EgfrError::MissingField("height_cm")));

        let no_ethnicity = Subject {
            ethnicity: None,
            ..Subject::adult(50.0, Gender::Male, Ethnicity::Black)
        };
        assert_eq!(no_ethnicity.validate(), Err(EgfrError::MissingField("ethnicity")));

        let negative_age = Subject::adult(-1.0, Gender::Male, Ethnicity::Black);
        assert!(negative_age.validate().is_err());
    }
}
