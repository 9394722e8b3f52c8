//! Survey answer model.
//!
//! # Invariants
//! - Answers are immutable once stored.
//! - At most one answer exists per `(survey_id, user_id)`.

use crate::model::survey::SurveyId;
use crate::model::user::{Gender, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AnswerId = Uuid;

/// Literal stored for a positive boolean answer.
pub const BOOLEAN_TRUE: &str = "true";
/// Literal stored for a negative boolean answer.
pub const BOOLEAN_FALSE: &str = "false";

/// One respondent's answer to one survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub survey_id: SurveyId,
    pub user_id: UserId,
    /// `true`/`false` for boolean surveys, an option id for list surveys.
    pub value: String,
}

impl Answer {
    pub fn new(survey_id: SurveyId, user_id: UserId, value: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            survey_id,
            user_id,
            value: value.into(),
        }
    }
}

/// Read-only projection of the answering user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respondent {
    pub gender: Gender,
    pub birthdate: NaiveDate,
}

/// Answer joined with its respondent projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondentAnswer {
    pub answer: Answer,
    pub respondent: Respondent,
}

/// Parses a stored boolean answer literal.
pub fn parse_boolean_answer(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        BOOLEAN_TRUE => Some(true),
        BOOLEAN_FALSE => Some(false),
        _ => None,
    }
}
