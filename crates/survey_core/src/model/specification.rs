//! Demographic weighting rules attached to a survey.
//!
//! # Responsibility
//! - Define the raw specification record as stored and edited.
//! - Validate and canonicalize raw rule values.
//!
//! # Invariants
//! - Gender values are `M` or `F`.
//! - Age values are decimal integers in `[MIN_AGE_BREAKPOINT, MAX_AGE_BREAKPOINT]`.
//! - Weights are finite and non-negative.

use crate::model::survey::SurveyId;
use crate::model::user::{Gender, MAX_AGE_YEARS};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a specification row.
pub type SpecificationId = Uuid;

/// Lowest age breakpoint; also the synthetic lower boundary.
pub const MIN_AGE_BREAKPOINT: u32 = 0;
/// Highest age breakpoint; also the synthetic upper boundary.
pub const MAX_AGE_BREAKPOINT: u32 = MAX_AGE_YEARS;

/// Respondent attribute a specification is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecificationKind {
    #[serde(rename = "G")]
    Gender,
    #[serde(rename = "A")]
    Age,
}

impl SpecificationKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Gender => "G",
            Self::Age => "A",
        }
    }

    /// Parses a kind code, accepting surrounding whitespace and lower case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "G" => Some(Self::Gender),
            "A" => Some(Self::Age),
            _ => None,
        }
    }
}

/// Raw weighting rule as stored in `survey_specifications`.
///
/// `value` stays a string so that persisted rows round-trip unchanged; the
/// summary engine parses it during rule normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    pub id: SpecificationId,
    pub survey_id: SurveyId,
    pub kind: SpecificationKind,
    pub value: String,
    pub weight: f64,
}

impl Specification {
    pub fn new(
        survey_id: SurveyId,
        kind: SpecificationKind,
        value: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            survey_id,
            kind,
            value: value.into(),
            weight,
        }
    }

    /// Checks value and weight against the rules for `kind`.
    pub fn validate(&self) -> Result<(), SpecificationValidationError> {
        validate_weight(self.weight)?;
        canonical_value(self.kind, &self.value).map(|_| ())
    }
}

/// Returns the canonical stored form of a raw rule value.
///
/// Gender values are upper-cased; age values are re-rendered as plain decimal.
pub fn canonical_value(
    kind: SpecificationKind,
    raw: &str,
) -> Result<String, SpecificationValidationError> {
    match kind {
        SpecificationKind::Gender => Gender::parse(raw)
            .map(|gender| gender.code().to_string())
            .ok_or_else(|| SpecificationValidationError::InvalidGender(raw.to_string())),
        SpecificationKind::Age => parse_age_breakpoint(raw)
            .map(|age| age.to_string())
            .ok_or_else(|| SpecificationValidationError::InvalidAge(raw.to_string())),
    }
}

/// Parses an age breakpoint within the supported range.
pub fn parse_age_breakpoint(raw: &str) -> Option<u32> {
    let age = raw.trim().parse::<u32>().ok()?;
    (MIN_AGE_BREAKPOINT..=MAX_AGE_BREAKPOINT)
        .contains(&age)
        .then_some(age)
}

pub fn validate_weight(weight: f64) -> Result<(), SpecificationValidationError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(SpecificationValidationError::InvalidWeight(weight));
    }
    Ok(())
}

/// Rule-level validation failures for [`Specification`].
#[derive(Debug, Clone, PartialEq)]
pub enum SpecificationValidationError {
    InvalidGender(String),
    InvalidAge(String),
    InvalidWeight(f64),
}

impl Display for SpecificationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGender(value) => {
                write!(f, "value `{value}` must be M or F when kind is gender")
            }
            Self::InvalidAge(value) => write!(
                f,
                "value `{value}` must be between {MIN_AGE_BREAKPOINT} and {MAX_AGE_BREAKPOINT} when kind is age"
            ),
            Self::InvalidWeight(weight) => {
                write!(f, "weight {weight} must be a non-negative number")
            }
        }
    }
}

impl Error for SpecificationValidationError {}
