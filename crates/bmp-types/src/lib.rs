//! # BMP Types
//!
//! Validated value types shared by the BMP core and its front ends.
//!
//! Every type here enforces its invariant at construction and deserialisation time, so code
//! holding a value never has to re-check it.

use serde::{Deserialize, Serialize};

/// Oldest age accepted in patient demographics.
pub const MAX_AGE: u32 = 120;

/// Errors that can occur when creating validated types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The age is outside the accepted `0..=120` range
    #[error("age must be between 0 and {MAX_AGE}, got {0}")]
    AgeOutOfRange(u32),
}

/// A canonical substance (DCI) identifier.
///
/// The wrapped string is always trimmed and uppercased, so two substances compare equal
/// exactly when their names match case-insensitively. Construction never fails: an empty
/// input yields an empty identifier, which simply matches nothing in the knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Substance(String);

impl Substance {
    /// Creates a new `Substance` from any free-text token.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    pub fn new(input: impl AsRef<str>) -> Self {
        Self(input.as_ref().trim().to_uppercase())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Substance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Substance {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Substance {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Substance {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Substance {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl serde::Serialize for Substance {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Substance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Substance::new(s))
    }
}

/// Administrative sex as used by the renal formula and the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Sex {
    /// Male.
    M,
    /// Female.
    F,
    /// Unknown or not stated.
    #[default]
    U,
}

impl Sex {
    /// Parse a free-text sex code.
    ///
    /// Accepts the single-letter codes as well as the English and French words, in any case.
    /// Anything unrecognised maps to [`Sex::U`].
    pub fn parse(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "M" | "H" | "MALE" | "HOMME" => Sex::M,
            "F" | "FEMALE" | "FEMME" => Sex::F,
            _ => Sex::U,
        }
    }

    /// Whether this value is female-coded.
    pub fn is_female(self) -> bool {
        self == Sex::F
    }

    /// Single-letter wire code.
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::M => "M",
            Sex::F => "F",
            Sex::U => "U",
        }
    }
}

impl std::fmt::Display for Sex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Sex {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Sex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Sex::parse(&s))
    }
}

/// Phase of a geriatric prescribing criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Potentially inappropriate medication that should be stopped.
    #[default]
    Stopp,
    /// Potentially beneficial medication that should be started.
    Start,
}

impl Phase {
    /// Parse a phase label. Only `START` (any case) selects [`Phase::Start`].
    pub fn from_wire(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("START") {
            Phase::Start
        } else {
            Phase::Stopp
        }
    }

    /// Uppercase wire label.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Stopp => "STOPP",
            Phase::Start => "START",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient demographics required by every rule evaluation.
///
/// An age is mandatory: the type cannot be built or deserialised without one, and ages above
/// [`MAX_AGE`] are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DemographicsWire")]
pub struct Demographics {
    age: u32,
    sex: Sex,
}

impl Demographics {
    /// Creates validated demographics.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::AgeOutOfRange`] if `age` exceeds [`MAX_AGE`].
    pub fn new(age: u32, sex: Sex) -> Result<Self, TypesError> {
        if age > MAX_AGE {
            return Err(TypesError::AgeOutOfRange(age));
        }
        Ok(Self { age, sex })
    }

    /// Age in whole years.
    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }
}

#[derive(Deserialize)]
struct DemographicsWire {
    age: u32,
    #[serde(default)]
    sex: Sex,
}

impl TryFrom<DemographicsWire> for Demographics {
    type Error = TypesError;

    fn try_from(wire: DemographicsWire) -> Result<Self, Self::Error> {
        Demographics::new(wire.age, wire.sex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substance_is_trimmed_and_uppercased() {
        let s = Substance::new("  ibuProfen ");
        assert_eq!(s.as_str(), "IBUPROFEN");
        assert_eq!(Substance::new(s.as_str()), s);
    }

    #[test]
    fn substance_deserialises_to_canonical_form() {
        let s: Substance = serde_json::from_str("\"lisinopril\"").expect("parse substance");
        assert_eq!(s.as_str(), "LISINOPRIL");
        assert_eq!(serde_json::to_string(&s).expect("render"), "\"LISINOPRIL\"");
    }

    #[test]
    fn sex_parses_common_codes() {
        assert_eq!(Sex::parse("f"), Sex::F);
        assert_eq!(Sex::parse(" Femme "), Sex::F);
        assert_eq!(Sex::parse("male"), Sex::M);
        assert_eq!(Sex::parse("other"), Sex::U);
        assert!(Sex::parse("FEMALE").is_female());
    }

    #[test]
    fn phase_defaults_to_stopp() {
        assert_eq!(Phase::from_wire("start"), Phase::Start);
        assert_eq!(Phase::from_wire("STOPP"), Phase::Stopp);
        assert_eq!(Phase::from_wire("anything"), Phase::Stopp);
    }

    #[test]
    fn demographics_rejects_age_above_limit() {
        assert_eq!(
            Demographics::new(121, Sex::M),
            Err(TypesError::AgeOutOfRange(121))
        );
        assert!(Demographics::new(120, Sex::M).is_ok());
    }

    #[test]
    fn demographics_requires_age_when_deserialised() {
        let err = serde_json::from_str::<Demographics>(r#"{"sex":"F"}"#)
            .expect_err("age is mandatory");
        assert!(err.to_string().contains("age"));

        let demo: Demographics = serde_json::from_str(r#"{"age":70}"#).expect("sex is optional");
        assert_eq!(demo.age(), 70);
        assert_eq!(demo.sex(), Sex::U);
    }

    #[test]
    fn demographics_rejects_out_of_range_age_when_deserialised() {
        let err = serde_json::from_str::<Demographics>(r#"{"age":150,"sex":"M"}"#)
            .expect_err("age out of range");
        assert!(err.to_string().contains("between 0 and 120"));
    }
}
