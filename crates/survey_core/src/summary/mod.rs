//! Weighted survey summarization engine.
//!
//! # Responsibility
//! - Normalize raw specifications into ordered gender and age rule sets.
//! - Compute one scalar weight per respondent.
//! - Aggregate answers into raw and weighted tallies per answer value.
//!
//! # Invariants
//! - The engine is pure: it reads a survey snapshot and never touches storage.
//! - A failure anywhere aborts the whole summary; partial results are never
//!   returned.

use crate::model::specification::SpecificationId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod aggregate;
pub mod rules;
pub mod weight;

pub use aggregate::{summarize_survey, OptionSummary, SummaryLabel, SurveySummary};
pub use rules::{normalize_specifications, AgeRule, GenderRule, NormalizedRules};
pub use weight::{respondent_weight, RespondentProfile};

pub type SummaryResult<T> = Result<T, SummaryError>;

/// Engine-level failures. None of them can be produced by validated input.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryError {
    /// A stored specification does not satisfy the rule contract.
    InvalidRule {
        specification_id: SpecificationId,
        message: String,
    },
    /// Respondent age falls outside the breakpoints covered by the age rules.
    AgeOutOfRange { age: u32, first: u32, last: u32 },
    /// Respondent birthdate lies after the summary reference date.
    BirthdateAfterReferenceDate,
    /// A list answer references an option that the survey does not have.
    UnknownOption(String),
    /// A boolean answer is neither `true` nor `false`.
    InvalidBooleanAnswer(String),
}

impl Display for SummaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRule {
                specification_id,
                message,
            } => write!(f, "invalid specification {specification_id}: {message}"),
            Self::AgeOutOfRange { age, first, last } => write!(
                f,
                "respondent age {age} is outside the weighted range [{first}, {last}]"
            ),
            Self::BirthdateAfterReferenceDate => {
                write!(f, "respondent birthdate is after the summary reference date")
            }
            Self::UnknownOption(value) => write!(f, "answer references unknown option `{value}`"),
            Self::InvalidBooleanAnswer(value) => {
                write!(f, "boolean answer `{value}` is neither true nor false")
            }
        }
    }
}

impl Error for SummaryError {}
