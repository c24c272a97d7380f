//! Renal dose adjustment.
//!
//! Creatinine clearance is estimated with the Cockcroft-Gault formula, with serum
//! creatinine in mg/dL and weight in kg:
//!
//! ```text
//! clcr = ((140 - age) * weight) / (72 * creatinine) * (0.85 if female)
//! ```

use crate::{BmpError, BmpResult};
use bmp_types::Sex;
use serde::Serialize;

const FEMALE_FACTOR: f64 = 0.85;
const CONTRAINDICATION_BELOW: f64 = 30.0;
const REDUCTION_BELOW: f64 = 60.0;

/// Dosing recommendation for a creatinine clearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenalAdjustment {
    /// `clcr < 30`
    #[serde(rename = "Contre-indication rénale")]
    Contraindicated,
    /// `30 <= clcr < 60`
    #[serde(rename = "Réduction 50% posologique")]
    HalfDose,
    /// `clcr >= 60`
    #[serde(rename = "Posologie normale")]
    Normal,
}

impl RenalAdjustment {
    pub fn for_clcr(clcr: f64) -> Self {
        if clcr < CONTRAINDICATION_BELOW {
            Self::Contraindicated
        } else if clcr < REDUCTION_BELOW {
            Self::HalfDose
        } else {
            Self::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contraindicated => "Contre-indication rénale",
            Self::HalfDose => "Réduction 50% posologique",
            Self::Normal => "Posologie normale",
        }
    }
}

impl std::fmt::Display for RenalAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clearance estimate together with the resulting recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenalAssessment {
    pub clcr: f64,
    pub adjustment: RenalAdjustment,
}

/// Estimates creatinine clearance in mL/min.
///
/// # Errors
///
/// Returns [`BmpError::Precondition`] if `creatinine` or `weight` is not strictly
/// positive, if `age` is zero, or if the age lies outside the formula's domain (over 140).
pub fn calculate_clcr(creatinine: f64, age: u32, weight: f64, sex: Sex) -> BmpResult<f64> {
    if creatinine.is_nan() || creatinine <= 0.0 {
        return Err(BmpError::Precondition(format!(
            "creatinine must be positive, got {creatinine}"
        )));
    }
    if weight.is_nan() || weight <= 0.0 {
        return Err(BmpError::Precondition(format!(
            "weight must be positive, got {weight}"
        )));
    }
    if age == 0 {
        return Err(BmpError::Precondition("age must be positive".into()));
    }

    let factor = if sex.is_female() { FEMALE_FACTOR } else { 1.0 };
    let clcr = ((140.0 - f64::from(age)) * weight) / (72.0 * creatinine) * factor;
    if clcr < 0.0 {
        return Err(BmpError::Precondition(format!(
            "age {age} is outside the Cockcroft-Gault domain"
        )));
    }
    Ok(clcr)
}

/// Recommendation for the given renal parameters.
///
/// # Errors
///
/// Same preconditions as [`calculate_clcr`].
pub fn adjust_for_renal(
    creatinine: f64,
    age: u32,
    weight: f64,
    sex: Sex,
) -> BmpResult<RenalAdjustment> {
    assess_renal(creatinine, age, weight, sex).map(|a| a.adjustment)
}

/// Clearance and recommendation in one call.
pub fn assess_renal(
    creatinine: f64,
    age: u32,
    weight: f64,
    sex: Sex,
) -> BmpResult<RenalAssessment> {
    let clcr = calculate_clcr(creatinine, age, weight, sex)?;
    let adjustment = RenalAdjustment::for_clcr(clcr);
    tracing::debug!(clcr, %adjustment, "renal assessment");
    Ok(RenalAssessment { clcr, adjustment })
}
