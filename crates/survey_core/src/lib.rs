//! Core domain logic for the survey platform.
//!
//! The crate owns the business invariants: survey lifecycle, answer
//! acceptance, option reconciliation and the weighted summary engine.
//! Transport layers call into [`service`]; storage is reached only through
//! the traits in [`repo`].

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod repo;
pub mod service;
pub mod summary;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::answer::{Answer, AnswerId, Respondent, RespondentAnswer};
pub use model::specification::{Specification, SpecificationKind};
pub use model::survey::{
    OptionId, Survey, SurveyId, SurveyKind, SurveyOption, SurveyStatus, SurveyType,
};
pub use model::user::{Gender, User, UserId};
pub use reconcile::{reconcile_options, reconcile_survey_options, OptionDecision};
pub use repo::answer_repo::{AnswerRepository, SqliteAnswerRepository};
pub use repo::survey_repo::{SqliteSurveyRepository, SurveyRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::answer_service::{AnswerService, SubmitAnswerRequest};
pub use service::summary_service::{SummarizeRequest, SummaryService};
pub use service::survey_service::{
    CreateSurveyRequest, SetSpecificationsRequest, SpecificationInput, SurveyActionRequest,
    SurveyService, UpdateSurveyRequest,
};
pub use service::user_service::{RegisterUserRequest, UserService};
pub use service::{FieldError, ServiceError, ServiceResult};
pub use summary::{OptionSummary, SummaryError, SummaryLabel, SurveySummary};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
