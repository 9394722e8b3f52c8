//! Answer repository contract and SQLite implementation.
//!
//! # Invariants
//! - Answers are insert-only.
//! - `(survey_id, user_id)` is unique; a duplicate insert is a `Conflict`.

use crate::model::answer::{Answer, AnswerId, Respondent, RespondentAnswer};
use crate::model::survey::SurveyId;
use crate::model::user::{Gender, UserId};
use crate::repo::{map_unique_violation, parse_date, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for survey answers.
pub trait AnswerRepository {
    fn create_answer(&self, answer: &Answer) -> RepoResult<AnswerId>;
    fn find_answer(&self, survey_id: SurveyId, user_id: UserId) -> RepoResult<Option<Answer>>;
    /// Lists every answer of a survey joined with its respondent projection.
    fn list_answers_with_respondents(
        &self,
        survey_id: SurveyId,
    ) -> RepoResult<Vec<RespondentAnswer>>;
}

/// SQLite-backed answer repository.
pub struct SqliteAnswerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAnswerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AnswerRepository for SqliteAnswerRepository<'_> {
    fn create_answer(&self, answer: &Answer) -> RepoResult<AnswerId> {
        self.conn
            .execute(
                "INSERT INTO survey_answers (id, survey_id, user_id, value)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    answer.id.to_string(),
                    answer.survey_id.to_string(),
                    answer.user_id.to_string(),
                    answer.value.as_str(),
                ],
            )
            .map_err(|err| map_unique_violation(err, "answer for this respondent"))?;

        Ok(answer.id)
    }

    fn find_answer(&self, survey_id: SurveyId, user_id: UserId) -> RepoResult<Option<Answer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, survey_id, user_id, value
             FROM survey_answers
             WHERE survey_id = ?1 AND user_id = ?2;",
        )?;
        stmt.query_row(
            params![survey_id.to_string(), user_id.to_string()],
            |row| Ok(parse_answer_row(row)),
        )
        .optional()?
        .transpose()
    }

    fn list_answers_with_respondents(
        &self,
        survey_id: SurveyId,
    ) -> RepoResult<Vec<RespondentAnswer>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                a.id AS id,
                a.survey_id AS survey_id,
                a.user_id AS user_id,
                a.value AS value,
                u.gender AS gender,
                u.birthdate AS birthdate
             FROM survey_answers a
             INNER JOIN users u ON u.id = a.user_id
             WHERE a.survey_id = ?1
             ORDER BY a.created_at ASC, a.id ASC;",
        )?;
        let mut rows = stmt.query([survey_id.to_string()])?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next()? {
            let gender_text: String = row.get("gender")?;
            let birthdate_text: String = row.get("birthdate")?;
            answers.push(RespondentAnswer {
                answer: parse_answer_row(row)?,
                respondent: Respondent {
                    gender: Gender::parse(&gender_text).ok_or_else(|| {
                        RepoError::InvalidData(format!(
                            "invalid gender `{gender_text}` in users.gender"
                        ))
                    })?,
                    birthdate: parse_date(&birthdate_text, "users.birthdate")?,
                },
            });
        }
        Ok(answers)
    }
}

fn parse_answer_row(row: &Row<'_>) -> RepoResult<Answer> {
    let id_text: String = row.get("id")?;
    let survey_text: String = row.get("survey_id")?;
    let user_text: String = row.get("user_id")?;

    Ok(Answer {
        id: parse_uuid(&id_text, "survey_answers.id")?,
        survey_id: parse_uuid(&survey_text, "survey_answers.survey_id")?,
        user_id: parse_uuid(&user_text, "survey_answers.user_id")?,
        value: row.get("value")?,
    })
}
