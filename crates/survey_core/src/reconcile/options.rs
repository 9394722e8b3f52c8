//! Option set reconciliation.
//!
//! # Invariants
//! - Label comparison is case-insensitive and order-independent.
//! - A replace always swaps the whole set; unchanged options are not patched
//!   in place, so their ids do not survive a replace.
//! - Switching a survey to boolean always clears its options.

use crate::model::survey::{Survey, SurveyOption, SurveyStatus, SurveyType};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of comparing proposed option labels with the stored set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionDecision {
    /// Stored options already match; leave them and their ids untouched.
    Keep,
    /// Delete every stored option and insert these labels instead.
    Replace(Vec<String>),
}

impl OptionDecision {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}

/// Reconciliation refused for lifecycle reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileError {
    /// Options are only editable while the survey is a draft.
    NotDraft(SurveyStatus),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDraft(status) => write!(
                f,
                "survey options are only editable in draft, current status is {}",
                status.code()
            ),
        }
    }
}

impl Error for ReconcileError {}

/// Decides what to do with `stored` given the target type and proposed labels.
pub fn reconcile_options(
    stored: &[SurveyOption],
    target: SurveyType,
    proposed: &[String],
) -> OptionDecision {
    match target {
        SurveyType::Boolean => OptionDecision::Replace(Vec::new()),
        SurveyType::List => {
            let unchanged = proposed.len() == stored.len()
                && proposed
                    .iter()
                    .all(|label| stored.iter().any(|option| option.same_label(label)));
            if unchanged {
                OptionDecision::Keep
            } else {
                OptionDecision::Replace(proposed.to_vec())
            }
        }
    }
}

/// Lifecycle-checked variant of [`reconcile_options`] for a loaded survey.
///
/// # Errors
/// - `NotDraft` unless `survey.status` is `Draft`.
pub fn reconcile_survey_options(
    survey: &Survey,
    target: SurveyType,
    proposed: &[String],
) -> Result<OptionDecision, ReconcileError> {
    if survey.status != SurveyStatus::Draft {
        return Err(ReconcileError::NotDraft(survey.status));
    }
    Ok(reconcile_options(survey.options(), target, proposed))
}
