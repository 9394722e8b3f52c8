//! Service error taxonomy shared by every use-case.
//!
//! Callers map each variant to a transport-level response; the services never
//! retry.

use crate::reconcile::ReconcileError;
use crate::repo::RepoError;
use crate::summary::SummaryError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Validation failure scoped to one request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Request field path, e.g. `title` or `specifications[2].value`.
    pub field: String,
    pub message: String,
}

/// Accumulator for field errors of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Returns whether any of `fields` already has an error.
    pub fn has_any(&self, fields: &[&str]) -> bool {
        self.errors
            .iter()
            .any(|error| fields.contains(&error.field.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Parses a required uuid field, recording an error when malformed.
    pub fn parse_id(&mut self, field: &str, raw: &str) -> Option<Uuid> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.push(field, format!("{field} is required"));
            return None;
        }
        match Uuid::parse_str(trimmed) {
            Ok(id) => Some(id),
            Err(_) => {
                self.push(field, format!("{field} must be a valid uuid"));
                None
            }
        }
    }

    /// Returns a trimmed required text field, recording an error when blank.
    pub fn require_text(&mut self, field: &str, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.push(field, format!("{field} is required"));
            return None;
        }
        Some(trimmed.to_string())
    }

    /// Fails with `ServiceError::Validation` when any error was collected.
    pub fn into_result(self) -> ServiceResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(self.errors))
        }
    }
}

/// Use-case level error.
#[derive(Debug)]
pub enum ServiceError {
    /// One or more request fields are invalid.
    Validation(Vec<FieldError>),
    /// A referenced survey or user does not exist.
    NotFound { entity: &'static str, id: Uuid },
    /// The requesting user may not act on the target.
    Forbidden(&'static str),
    /// The target is not in the lifecycle stage the operation requires.
    InvalidState(String),
    /// Stored data contradicts a core invariant.
    InconsistentState(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(errors) => {
                write!(f, "one or more properties are invalid:")?;
                for error in errors {
                    write!(f, " {}: {};", error.field, error.message)?;
                }
                Ok(())
            }
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Forbidden(message) => write!(f, "forbidden: {message}"),
            Self::InvalidState(message) => write!(f, "invalid state: {message}"),
            Self::InconsistentState(message) => write!(f, "inconsistent state: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}

impl From<SummaryError> for ServiceError {
    fn from(value: SummaryError) -> Self {
        match value {
            SummaryError::AgeOutOfRange { .. } | SummaryError::BirthdateAfterReferenceDate => {
                Self::InvalidState(value.to_string())
            }
            other => Self::InconsistentState(other.to_string()),
        }
    }
}

impl From<ReconcileError> for ServiceError {
    fn from(value: ReconcileError) -> Self {
        Self::InvalidState(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldErrors, ServiceError};

    #[test]
    fn field_errors_collect_before_rejecting() {
        let mut errors = FieldErrors::new();
        assert!(errors.parse_id("survey_id", "nope").is_none());
        assert!(errors.require_text("title", "   ").is_none());
        assert!(errors.has_any(&["title"]));
        assert!(!errors.has_any(&["user_id"]));

        match errors.into_result() {
            Err(ServiceError::Validation(list)) => {
                let fields: Vec<_> = list.iter().map(|error| error.field.as_str()).collect();
                assert_eq!(fields, vec!["survey_id", "title"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_collector_passes() {
        assert!(FieldErrors::new().into_result().is_ok());
    }
}
