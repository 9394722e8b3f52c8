//! Answer submission use-case.
//!
//! # Invariants
//! - Answers are accepted only while the survey is `Published`.
//! - One answer per respondent and survey.
//! - Boolean answers are stored as lower-case `true`/`false`; list answers as
//!   the chosen option id.

use crate::model::answer::{parse_boolean_answer, Answer, BOOLEAN_FALSE, BOOLEAN_TRUE};
use crate::model::survey::{SurveyKind, SurveyStatus};
use crate::repo::answer_repo::AnswerRepository;
use crate::repo::survey_repo::SurveyRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::error::{FieldErrors, ServiceError, ServiceResult};
use log::info;
use uuid::Uuid;

/// Raw answer input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitAnswerRequest {
    pub survey_id: String,
    pub user_id: String,
    pub value: String,
}

/// Answer service facade over repository implementations.
pub struct AnswerService<S: SurveyRepository, A: AnswerRepository, U: UserRepository> {
    surveys: S,
    answers: A,
    users: U,
}

impl<S: SurveyRepository, A: AnswerRepository, U: UserRepository> AnswerService<S, A, U> {
    pub fn new(surveys: S, answers: A, users: U) -> Self {
        Self {
            surveys,
            answers,
            users,
        }
    }

    /// Records one respondent's answer to a published survey.
    pub fn submit_answer(&self, request: &SubmitAnswerRequest) -> ServiceResult<Answer> {
        let mut errors = FieldErrors::new();
        let survey_id = errors.parse_id("survey_id", &request.survey_id);
        let user_id = errors.parse_id("user_id", &request.user_id);
        let raw_value = errors.require_text("value", &request.value);
        let (Some(survey_id), Some(user_id)) = (survey_id, user_id) else {
            errors.into_result()?;
            return Err(ServiceError::InconsistentState(
                "answer ids missing after validation".to_string(),
            ));
        };

        let survey = self
            .surveys
            .get_survey(survey_id)?
            .ok_or(ServiceError::NotFound {
                entity: "survey",
                id: survey_id,
            })?;
        if survey.status != SurveyStatus::Published {
            return Err(ServiceError::InvalidState(
                "answers are only accepted while the survey is published".to_string(),
            ));
        }
        if self.users.get_user(user_id)?.is_none() {
            return Err(ServiceError::NotFound {
                entity: "user",
                id: user_id,
            });
        }

        let value = raw_value.and_then(|raw| match &survey.kind {
            SurveyKind::Boolean => match parse_boolean_answer(&raw) {
                Some(true) => Some(BOOLEAN_TRUE.to_string()),
                Some(false) => Some(BOOLEAN_FALSE.to_string()),
                None => {
                    errors.push("value", "value must be true or false");
                    None
                }
            },
            SurveyKind::List(_) => {
                let option = Uuid::parse_str(&raw)
                    .ok()
                    .and_then(|option_id| survey.find_option(option_id));
                match option {
                    Some(option) => Some(option.id.to_string()),
                    None => {
                        errors.push("value", "option not found");
                        None
                    }
                }
            }
        });

        if self.answers.find_answer(survey_id, user_id)?.is_some() {
            errors.push("user_id", "user already answered this survey");
        }

        errors.into_result()?;
        let Some(value) = value else {
            return Err(ServiceError::InconsistentState(
                "answer value missing after validation".to_string(),
            ));
        };

        let answer = Answer::new(survey_id, user_id, value);
        match self.answers.create_answer(&answer) {
            Ok(_) => {}
            Err(RepoError::Conflict(_)) => {
                let mut errors = FieldErrors::new();
                errors.push("user_id", "user already answered this survey");
                errors.into_result()?;
            }
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=answer_submit module=service status=ok survey_id={survey_id} answer_id={}",
            answer.id
        );
        Ok(answer)
    }
}
