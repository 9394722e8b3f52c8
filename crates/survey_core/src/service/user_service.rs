//! User registration use-case.
//!
//! Accounts are the respondent source for summaries; authentication material
//! is handled outside this crate.

use crate::model::user::{whole_years_between, Gender, User, MAX_AGE_YEARS};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::service::error::{FieldErrors, ServiceError, ServiceResult};
use chrono::{NaiveDate, Utc};
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Raw registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterUserRequest {
    pub email: String,
    pub gender: String,
    /// ISO `YYYY-MM-DD`.
    pub birthdate: String,
}

/// User service facade over repository implementations.
pub struct UserService<U: UserRepository> {
    users: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    /// Registers a user, using today's UTC date for the birthdate checks.
    pub fn register(&self, request: &RegisterUserRequest) -> ServiceResult<User> {
        self.register_on(request, Utc::now().date_naive())
    }

    /// Registers a user, validating the birthdate against `today`.
    pub fn register_on(
        &self,
        request: &RegisterUserRequest,
        today: NaiveDate,
    ) -> ServiceResult<User> {
        let mut errors = FieldErrors::new();

        let email = errors
            .require_text("email", &request.email)
            .map(|value| value.to_lowercase());
        if let Some(value) = email.as_deref() {
            if !EMAIL_RE.is_match(value) {
                errors.push("email", "email must be a valid address");
            } else if self.users.find_user_by_email(value)?.is_some() {
                errors.push("email", "email is already registered");
            }
        }

        let gender = Gender::parse(&request.gender);
        if gender.is_none() {
            errors.push("gender", "gender must be M or F");
        }

        let birthdate = parse_birthdate(&mut errors, &request.birthdate, today);

        errors.into_result()?;
        let (Some(email), Some(gender), Some(birthdate)) = (email, gender, birthdate) else {
            return Err(ServiceError::InconsistentState(
                "registration fields missing after validation".to_string(),
            ));
        };

        let user = User::new(email, gender, birthdate);
        match self.users.create_user(&user) {
            Ok(_) => {}
            Err(RepoError::Conflict(_)) => {
                let mut errors = FieldErrors::new();
                errors.push("email", "email is already registered");
                errors.into_result()?;
            }
            Err(err) => return Err(err.into()),
        }

        info!("event=user_register module=service status=ok user_id={}", user.id);
        Ok(user)
    }
}

fn parse_birthdate(errors: &mut FieldErrors, raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = errors.require_text("birthdate", raw)?;
    let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") else {
        errors.push("birthdate", "birthdate must be formatted as YYYY-MM-DD");
        return None;
    };
    match whole_years_between(date, today) {
        None => {
            errors.push("birthdate", "birthdate must not be in the future");
            None
        }
        Some(age) if age > MAX_AGE_YEARS => {
            errors.push(
                "birthdate",
                format!("age must not exceed {MAX_AGE_YEARS} years"),
            );
            None
        }
        Some(_) => Some(date),
    }
}
