//! Survey domain model.
//!
//! # Responsibility
//! - Define the survey record together with its owned option set.
//! - Encode the one-way `Draft -> Published -> Closed` lifecycle.
//!
//! # Invariants
//! - Only `SurveyKind::List` carries options.
//! - Status transitions never skip a stage and never go backwards.

use crate::model::specification::Specification;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a survey.
pub type SurveyId = Uuid;

/// Stable identifier of a selectable survey option.
pub type OptionId = Uuid;

/// Survey lifecycle stage as stored in `surveys.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyStatus {
    #[serde(rename = "D")]
    Draft,
    #[serde(rename = "P")]
    Published,
    #[serde(rename = "C")]
    Closed,
}

impl SurveyStatus {
    pub fn code(self) -> &'static str {
        match self {
            Self::Draft => "D",
            Self::Published => "P",
            Self::Closed => "C",
        }
    }

    pub fn from_code(value: &str) -> Option<Self> {
        match value {
            "D" => Some(Self::Draft),
            "P" => Some(Self::Published),
            "C" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Returns the only stage reachable from `self`, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Draft => Some(Self::Published),
            Self::Published => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

/// Answer shape of a survey, without associated data.
///
/// Used where only the code matters: requests, storage, reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurveyType {
    #[serde(rename = "B")]
    Boolean,
    #[serde(rename = "L")]
    List,
}

impl SurveyType {
    pub fn code(self) -> &'static str {
        match self {
            Self::Boolean => "B",
            Self::List => "L",
        }
    }

    /// Parses a type code, accepting surrounding whitespace and lower case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "B" => Some(Self::Boolean),
            "L" => Some(Self::List),
            _ => None,
        }
    }
}

/// One selectable option of a list survey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyOption {
    pub id: OptionId,
    pub survey_id: SurveyId,
    pub label: String,
}

impl SurveyOption {
    pub fn new(survey_id: SurveyId, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            survey_id,
            label: label.into(),
        }
    }

    /// Case-insensitive label equality used to decide option identity.
    pub fn same_label(&self, label: &str) -> bool {
        labels_match(&self.label, label)
    }
}

/// Compares two option labels ignoring case.
pub fn labels_match(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Survey type with its type-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options")]
pub enum SurveyKind {
    /// Yes/no survey; answers are the literals `true` and `false`.
    Boolean,
    /// Single choice among the listed options; answers are option ids.
    List(Vec<SurveyOption>),
}

impl SurveyKind {
    pub fn survey_type(&self) -> SurveyType {
        match self {
            Self::Boolean => SurveyType::Boolean,
            Self::List(_) => SurveyType::List,
        }
    }

    /// Returns the option set; always empty for boolean surveys.
    pub fn options(&self) -> &[SurveyOption] {
        match self {
            Self::Boolean => &[],
            Self::List(options) => options,
        }
    }
}

/// Canonical survey record with eagerly loaded children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Survey {
    pub id: SurveyId,
    pub owner_id: UserId,
    pub title: String,
    pub description: String,
    pub status: SurveyStatus,
    pub kind: SurveyKind,
    pub specifications: Vec<Specification>,
}

impl Survey {
    /// Creates a draft survey with a generated stable ID and no specifications.
    pub fn new_draft(
        owner_id: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: SurveyKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            title: title.into(),
            description: description.into(),
            status: SurveyStatus::Draft,
            kind,
            specifications: Vec::new(),
        }
    }

    pub fn survey_type(&self) -> SurveyType {
        self.kind.survey_type()
    }

    pub fn options(&self) -> &[SurveyOption] {
        self.kind.options()
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    pub fn find_option(&self, option_id: OptionId) -> Option<&SurveyOption> {
        self.options().iter().find(|option| option.id == option_id)
    }
}
