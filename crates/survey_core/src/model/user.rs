//! User and respondent model.
//!
//! # Responsibility
//! - Define the account record consumed as respondent data by summaries.
//! - Derive whole-year age from a birthdate.
//!
//! # Invariants
//! - `gender` is always one of the two supported codes.
//! - `birthdate` is never after the registration date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a user account.
pub type UserId = Uuid;

/// Oldest age, in whole years, the platform accepts for a respondent.
pub const MAX_AGE_YEARS: u32 = 150;

/// Respondent gender as stored in `users.gender`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    /// Parses a gender code, accepting surrounding whitespace and lower case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "M" => Some(Self::Male),
            "F" => Some(Self::Female),
            _ => None,
        }
    }

    /// Returns the single-letter storage code.
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "F",
        }
    }
}

/// Account record. Authentication material lives outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Stored lower-cased and trimmed.
    pub email: String,
    pub gender: Gender,
    pub birthdate: NaiveDate,
}

impl User {
    /// Creates a user with a generated stable ID.
    pub fn new(email: impl Into<String>, gender: Gender, birthdate: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            gender,
            birthdate,
        }
    }

    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.email.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        Ok(())
    }
}

/// Counts completed years from `birthdate` to `date`.
pub fn whole_years_between(birthdate: NaiveDate, date: NaiveDate) -> Option<u32> {
    if date < birthdate {
        return None;
    }
    let mut years = date.year() - birthdate.year();
    if (date.month(), date.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// Record-level validation failures for [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyEmail,
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "user email must not be empty"),
        }
    }
}

impl Error for UserValidationError {}

#[cfg(test)]
mod tests {
    use super::{whole_years_between, Gender};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn gender_parse_is_case_insensitive() {
        assert_eq!(Gender::parse(" f "), Some(Gender::Female));
        assert_eq!(Gender::parse("M"), Some(Gender::Male));
        assert_eq!(Gender::parse("x"), None);
    }

    #[test]
    fn whole_years_counts_only_completed_birthdays() {
        assert_eq!(whole_years_between(date(1960, 6, 15), date(2020, 6, 14)), Some(59));
        assert_eq!(whole_years_between(date(1960, 6, 15), date(2020, 6, 15)), Some(60));
        assert_eq!(whole_years_between(date(2000, 1, 1), date(2000, 1, 1)), Some(0));
    }

    #[test]
    fn whole_years_rejects_future_birthdate() {
        assert_eq!(whole_years_between(date(2030, 1, 1), date(2020, 1, 1)), None);
    }
}
