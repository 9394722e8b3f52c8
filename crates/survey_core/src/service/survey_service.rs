//! Survey lifecycle use-cases.
//!
//! # Responsibility
//! - Create and edit draft surveys, including option reconciliation.
//! - Drive the `Draft -> Published -> Closed` lifecycle.
//! - Replace a draft survey's specification set.
//!
//! # Invariants
//! - Only the owner may mutate a survey.
//! - Content, options and specifications are editable only in `Draft`.
//! - List surveys keep at least two distinct options.

use crate::model::specification::{
    canonical_value, validate_weight, Specification, SpecificationKind,
};
use crate::model::survey::{
    labels_match, Survey, SurveyId, SurveyKind, SurveyOption, SurveyStatus, SurveyType,
};
use crate::model::user::UserId;
use crate::reconcile::{reconcile_survey_options, OptionDecision};
use crate::repo::survey_repo::SurveyRepository;
use crate::repo::user_repo::UserRepository;
use crate::service::error::{FieldErrors, ServiceError, ServiceResult};
use log::info;

const MIN_LIST_OPTIONS: usize = 2;

/// Input for creating a draft survey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSurveyRequest {
    pub user_id: String,
    pub title: String,
    pub description: String,
    /// `B` (boolean) or `L` (list), case-insensitive.
    pub survey_type: String,
    /// Ignored for boolean surveys.
    pub options: Vec<String>,
}

/// Input for editing a draft survey. Fields replace stored values wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSurveyRequest {
    pub survey_id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub survey_type: String,
    pub options: Vec<String>,
}

/// Input for lifecycle transitions (publish, close).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyActionRequest {
    pub survey_id: String,
    pub user_id: String,
}

/// One raw weighting rule as submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificationInput {
    /// `G` (gender) or `A` (age), case-insensitive.
    pub kind: String,
    pub value: String,
    pub weight: f64,
}

/// Input for replacing a survey's specification set.
#[derive(Debug, Clone, PartialEq)]
pub struct SetSpecificationsRequest {
    pub survey_id: String,
    pub user_id: String,
    pub specifications: Vec<SpecificationInput>,
}

/// Survey service facade over repository implementations.
pub struct SurveyService<S: SurveyRepository, U: UserRepository> {
    surveys: S,
    users: U,
}

/// Validated survey content shared by create and update.
struct SurveyContent {
    title: String,
    description: String,
    survey_type: SurveyType,
    options: Vec<String>,
}

impl<S: SurveyRepository, U: UserRepository> SurveyService<S, U> {
    pub fn new(surveys: S, users: U) -> Self {
        Self { surveys, users }
    }

    /// Loads one survey with options and specifications.
    pub fn get_survey(&self, survey_id: &str) -> ServiceResult<Survey> {
        let mut errors = FieldErrors::new();
        let id = errors.parse_id("survey_id", survey_id);
        errors.into_result()?;
        let Some(id) = id else {
            return Err(missing_after_validation());
        };
        self.surveys
            .get_survey(id)?
            .ok_or(ServiceError::NotFound {
                entity: "survey",
                id,
            })
    }

    /// Creates a draft survey owned by `request.user_id`.
    pub fn create_survey(&self, request: &CreateSurveyRequest) -> ServiceResult<Survey> {
        let mut errors = FieldErrors::new();
        let owner_id = errors.parse_id("user_id", &request.user_id);
        if let Some(id) = owner_id {
            if self.users.get_user(id)?.is_none() {
                errors.push("user_id", "user not found");
            }
        }
        let content = validate_content(
            &mut errors,
            &request.title,
            &request.description,
            &request.survey_type,
            &request.options,
        );

        if let (Some(owner_id), Some(title)) = (owner_id, content.title.as_deref()) {
            if !errors.has_any(&["user_id"])
                && self
                    .surveys
                    .find_open_survey_by_title(owner_id, title)?
                    .is_some()
            {
                errors.push("title", "title is already used by another open survey");
            }
        }

        errors.into_result()?;
        let (Some(owner_id), Some(content)) = (owner_id, content.complete()) else {
            return Err(missing_after_validation());
        };

        let mut survey = Survey::new_draft(
            owner_id,
            content.title,
            content.description,
            SurveyKind::Boolean,
        );
        if content.survey_type == SurveyType::List {
            survey.kind = SurveyKind::List(
                content
                    .options
                    .iter()
                    .map(|label| SurveyOption::new(survey.id, label.as_str()))
                    .collect(),
            );
        }

        let survey_id = self.surveys.create_survey(&survey)?;
        info!(
            "event=survey_create module=service status=ok survey_id={survey_id} type={} options={}",
            survey.survey_type().code(),
            survey.options().len()
        );
        self.read_back(survey_id, "created survey not found in read-back")
    }

    /// Edits a draft survey; options are replaced only when they changed.
    pub fn update_survey(&self, request: &UpdateSurveyRequest) -> ServiceResult<Survey> {
        let mut errors = FieldErrors::new();
        let survey_id = errors.parse_id("survey_id", &request.survey_id);
        let user_id = errors.parse_id("user_id", &request.user_id);
        let content = validate_content(
            &mut errors,
            &request.title,
            &request.description,
            &request.survey_type,
            &request.options,
        );
        let (Some(survey_id), Some(user_id)) = (survey_id, user_id) else {
            errors.into_result()?;
            return Err(missing_after_validation());
        };

        let mut survey = self.load_owned(survey_id, user_id)?;
        if survey.status != SurveyStatus::Draft {
            return Err(ServiceError::InvalidState(
                "published or closed surveys cannot be updated".to_string(),
            ));
        }

        if let Some(title) = content.title.as_deref() {
            if let Some(existing) = self.surveys.find_open_survey_by_title(user_id, title)? {
                if existing != survey.id {
                    errors.push("title", "title is already used by another open survey");
                }
            }
        }

        errors.into_result()?;
        let Some(content) = content.complete() else {
            return Err(missing_after_validation());
        };

        let decision = reconcile_survey_options(&survey, content.survey_type, &content.options)?;

        survey.title = content.title;
        survey.description = content.description;
        if survey.survey_type() != content.survey_type {
            survey.kind = match content.survey_type {
                SurveyType::Boolean => SurveyKind::Boolean,
                SurveyType::List => SurveyKind::List(Vec::new()),
            };
        }
        let replacement = match &decision {
            OptionDecision::Keep => None,
            OptionDecision::Replace(labels) => Some(labels.as_slice()),
        };
        self.surveys.update_survey(&survey, replacement)?;
        let replaced = !decision.is_keep();

        info!(
            "event=survey_update module=service status=ok \
             survey_id={} type={} options_replaced={replaced}",
            survey.id,
            content.survey_type.code()
        );
        self.read_back(survey.id, "updated survey not found in read-back")
    }

    /// Moves a draft survey to `Published`.
    pub fn publish_survey(&self, request: &SurveyActionRequest) -> ServiceResult<Survey> {
        self.transition(request, SurveyStatus::Published)
    }

    /// Moves a published survey to `Closed`.
    pub fn close_survey(&self, request: &SurveyActionRequest) -> ServiceResult<Survey> {
        self.transition(request, SurveyStatus::Closed)
    }

    /// Replaces the whole specification set of a draft survey.
    pub fn set_specifications(
        &self,
        request: &SetSpecificationsRequest,
    ) -> ServiceResult<Vec<Specification>> {
        let mut errors = FieldErrors::new();
        let survey_id = errors.parse_id("survey_id", &request.survey_id);
        let user_id = errors.parse_id("user_id", &request.user_id);
        let (Some(survey_id), Some(user_id)) = (survey_id, user_id) else {
            errors.into_result()?;
            return Err(missing_after_validation());
        };

        let survey = self.load_owned(survey_id, user_id)?;
        if survey.status != SurveyStatus::Draft {
            return Err(ServiceError::InvalidState(
                "specifications are only editable while the survey is a draft".to_string(),
            ));
        }

        let mut specs = Vec::with_capacity(request.specifications.len());
        for (idx, input) in request.specifications.iter().enumerate() {
            if let Some(spec) = validate_specification(&mut errors, survey.id, idx, input) {
                specs.push(spec);
            }
        }
        errors.into_result()?;

        let stored = self.surveys.replace_specifications(survey.id, &specs)?;
        info!(
            "event=specifications_replace module=service status=ok survey_id={} count={}",
            survey.id,
            stored.len()
        );
        Ok(stored)
    }

    fn transition(
        &self,
        request: &SurveyActionRequest,
        target: SurveyStatus,
    ) -> ServiceResult<Survey> {
        let mut errors = FieldErrors::new();
        let survey_id = errors.parse_id("survey_id", &request.survey_id);
        let user_id = errors.parse_id("user_id", &request.user_id);
        errors.into_result()?;
        let (Some(survey_id), Some(user_id)) = (survey_id, user_id) else {
            return Err(missing_after_validation());
        };

        let survey = self.load_owned(survey_id, user_id)?;
        if !survey.status.can_transition_to(target) {
            return Err(ServiceError::InvalidState(format!(
                "survey cannot move from {} to {}",
                survey.status.code(),
                target.code()
            )));
        }

        self.surveys.set_status(survey.id, target)?;
        info!(
            "event=survey_transition module=service status=ok survey_id={} from={} to={}",
            survey.id,
            survey.status.code(),
            target.code()
        );
        self.read_back(survey.id, "survey missing after status change")
    }

    fn load_owned(&self, survey_id: SurveyId, user_id: UserId) -> ServiceResult<Survey> {
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
        Ok(survey)
    }

    fn read_back(&self, survey_id: SurveyId, context: &str) -> ServiceResult<Survey> {
        self.surveys
            .get_survey(survey_id)?
            .ok_or_else(|| ServiceError::InconsistentState(context.to_string()))
    }
}

/// Partially validated content; fields are `None` when invalid.
struct PendingContent {
    title: Option<String>,
    description: Option<String>,
    survey_type: Option<SurveyType>,
    options: Vec<String>,
}

impl PendingContent {
    fn complete(self) -> Option<SurveyContent> {
        Some(SurveyContent {
            title: self.title?,
            description: self.description?,
            survey_type: self.survey_type?,
            options: self.options,
        })
    }
}

fn validate_content(
    errors: &mut FieldErrors,
    title: &str,
    description: &str,
    survey_type: &str,
    options: &[String],
) -> PendingContent {
    let title = errors.require_text("title", title);
    let description = errors.require_text("description", description);
    let survey_type = SurveyType::parse(survey_type);
    if survey_type.is_none() {
        errors.push("type", "type must be B or L");
    }

    let options = match survey_type {
        Some(SurveyType::List) => {
            let unique = dedupe_labels(options);
            if unique.len() < MIN_LIST_OPTIONS {
                errors.push(
                    "options",
                    format!("options must have at least {MIN_LIST_OPTIONS} distinct values"),
                );
            }
            unique
        }
        _ => Vec::new(),
    };

    PendingContent {
        title,
        description,
        survey_type,
        options,
    }
}

/// Trims labels, drops blanks and removes case-insensitive duplicates,
/// keeping the first spelling.
fn dedupe_labels(labels: &[String]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        let trimmed = label.trim();
        if trimmed.is_empty() || unique.iter().any(|seen| labels_match(seen, trimmed)) {
            continue;
        }
        unique.push(trimmed.to_string());
    }
    unique
}

fn validate_specification(
    errors: &mut FieldErrors,
    survey_id: SurveyId,
    idx: usize,
    input: &SpecificationInput,
) -> Option<Specification> {
    let field = format!("specifications[{idx}]");

    let kind = SpecificationKind::parse(&input.kind);
    if kind.is_none() {
        errors.push(format!("{field}.kind"), "kind must be G or A");
    }

    if let Err(err) = validate_weight(input.weight) {
        errors.push(format!("{field}.weight"), err.to_string());
    }

    let value = kind.and_then(|kind| match canonical_value(kind, &input.value) {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(format!("{field}.value"), err.to_string());
            None
        }
    });

    match (kind, value) {
        (Some(kind), Some(value)) if validate_weight(input.weight).is_ok() => {
            Some(Specification::new(survey_id, kind, value, input.weight))
        }
        _ => None,
    }
}

fn missing_after_validation() -> ServiceError {
    ServiceError::InconsistentState("required fields missing after validation".to_string())
}
