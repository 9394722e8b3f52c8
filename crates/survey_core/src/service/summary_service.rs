//! Survey summarization use-case.
//!
//! # Responsibility
//! - Gate summaries on ownership and the `Closed` lifecycle stage.
//! - Feed the stored survey snapshot and its answers to the summary engine.
//!
//! # Invariants
//! - Every precondition is checked before aggregation starts.
//! - A closed survey accepts no new answers, so the answer snapshot is stable
//!   for the duration of one call.

use crate::model::survey::SurveyStatus;
use crate::repo::answer_repo::AnswerRepository;
use crate::repo::survey_repo::SurveyRepository;
use crate::service::error::{FieldErrors, ServiceError, ServiceResult};
use crate::summary::{summarize_survey, SurveySummary};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::time::Instant;

/// Raw summary input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizeRequest {
    pub survey_id: String,
    /// Requesting user; must own the survey.
    pub user_id: String,
}

/// Summary service built from its survey and answer collaborators.
pub struct SummaryService<S: SurveyRepository, A: AnswerRepository> {
    surveys: S,
    answers: A,
}

impl<S: SurveyRepository, A: AnswerRepository> SummaryService<S, A> {
    pub fn new(surveys: S, answers: A) -> Self {
        Self { surveys, answers }
    }

    /// Summarizes a closed survey with ages derived on today's UTC date.
    pub fn summarize(&self, request: &SummarizeRequest) -> ServiceResult<SurveySummary> {
        self.summarize_on(request, Utc::now().date_naive())
    }

    /// Summarizes a closed survey with ages derived on `reference_date`.
    ///
    /// # Errors
    /// - `Validation` for malformed ids.
    /// - `NotFound` when the survey does not exist.
    /// - `Forbidden` when the requester does not own the survey.
    /// - `InvalidState` when the survey is not closed or a respondent's age
    ///   is outside the weighted range.
    pub fn summarize_on(
        &self,
        request: &SummarizeRequest,
        reference_date: NaiveDate,
    ) -> ServiceResult<SurveySummary> {
        let started_at = Instant::now();
        let mut errors = FieldErrors::new();
        let survey_id = errors.parse_id("survey_id", &request.survey_id);
        let user_id = errors.parse_id("user_id", &request.user_id);
        errors.into_result()?;
        let (Some(survey_id), Some(user_id)) = (survey_id, user_id) else {
            return Err(ServiceError::InconsistentState(
                "summary ids missing after validation".to_string(),
            ));
        };

        let survey = self
            .surveys
            .get_survey(survey_id)?
            .ok_or(ServiceError::NotFound {
                entity: "survey",
                id: survey_id,
            })?;
        if !survey.is_owned_by(user_id) {
            return Err(ServiceError::Forbidden(
                "you don't have permission to manage this survey",
            ));
        }
        if survey.status != SurveyStatus::Closed {
            return Err(ServiceError::InvalidState("survey is not closed".to_string()));
        }

        let answers = self.answers.list_answers_with_respondents(survey_id)?;
        let summary = summarize_survey(&survey, &answers, reference_date).map_err(|err| {
            warn!(
                "event=survey_summarize module=service status=error survey_id={survey_id} error={err}"
            );
            ServiceError::from(err)
        })?;

        info!(
            "event=survey_summarize module=service status=ok survey_id={survey_id} answers={} entries={} duration_ms={}",
            answers.len(),
            summary.results.len(),
            started_at.elapsed().as_millis()
        );
        Ok(summary)
    }
}
