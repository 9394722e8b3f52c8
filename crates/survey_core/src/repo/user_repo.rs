//! User repository contract and SQLite implementation.

use crate::model::user::{Gender, User, UserId};
use crate::repo::{format_date, map_unique_violation, parse_date, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT id, email, gender, birthdate FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Case-insensitive lookup by email.
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (id, email, gender, birthdate) VALUES (?1, ?2, ?3, ?4);",
                params![
                    user.id.to_string(),
                    user.email.as_str(),
                    user.gender.code(),
                    format_date(user.birthdate),
                ],
            )
            .map_err(|err| map_unique_violation(err, "user email"))?;

        Ok(user.id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        stmt.query_row([id.to_string()], |row| Ok(parse_user_row(row)))
            .optional()?
            .transpose()
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE email = ?1 COLLATE NOCASE;"))?;
        stmt.query_row([email.trim()], |row| Ok(parse_user_row(row)))
            .optional()?
            .transpose()
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let id_text: String = row.get("id")?;
    let gender_text: String = row.get("gender")?;
    let gender = Gender::parse(&gender_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid gender `{gender_text}` in users.gender"))
    })?;
    let birthdate_text: String = row.get("birthdate")?;

    Ok(User {
        id: parse_uuid(&id_text, "users.id")?,
        email: row.get("email")?,
        gender,
        birthdate: parse_date(&birthdate_text, "users.birthdate")?,
    })
}
