//! Survey repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist surveys together with their option and specification sets.
//! - Load surveys with both child sets eagerly attached.
//!
//! # Invariants
//! - Option and specification sets are replaced wholesale in one transaction.
//! - Child rows keep caller order through an explicit `position` column.
//! - Deleting a survey cascades to options, specifications and answers.

use crate::model::specification::{Specification, SpecificationKind};
use crate::model::survey::{
    Survey, SurveyId, SurveyKind, SurveyOption, SurveyStatus, SurveyType,
};
use crate::model::user::UserId;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for surveys and their child sets.
pub trait SurveyRepository {
    /// Inserts the survey with its options and specifications.
    fn create_survey(&self, survey: &Survey) -> RepoResult<SurveyId>;
    /// Loads one survey with options and specifications attached.
    fn get_survey(&self, id: SurveyId) -> RepoResult<Option<Survey>>;
    /// Finds a non-closed survey of `owner_id` whose title matches ignoring case.
    fn find_open_survey_by_title(
        &self,
        owner_id: UserId,
        title: &str,
    ) -> RepoResult<Option<SurveyId>>;
    /// Writes title, description and type, and when `options` is set replaces
    /// the whole option set with those labels in order. Both writes commit
    /// together or not at all.
    fn update_survey(&self, survey: &Survey, options: Option<&[String]>) -> RepoResult<()>;
    /// Deletes every stored specification and inserts `specs` in order.
    fn replace_specifications(
        &self,
        survey_id: SurveyId,
        specs: &[Specification],
    ) -> RepoResult<Vec<Specification>>;
    fn set_status(&self, survey_id: SurveyId, status: SurveyStatus) -> RepoResult<()>;
    fn delete_survey(&self, survey_id: SurveyId) -> RepoResult<()>;
}

/// SQLite-backed survey repository.
pub struct SqliteSurveyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSurveyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SurveyRepository for SqliteSurveyRepository<'_> {
    fn create_survey(&self, survey: &Survey) -> RepoResult<SurveyId> {
        for spec in &survey.specifications {
            spec.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO surveys (
                id,
                user_id,
                title,
                normalized_title,
                description,
                normalized_description,
                type,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                survey.id.to_string(),
                survey.owner_id.to_string(),
                survey.title.as_str(),
                normalize_text(&survey.title),
                survey.description.as_str(),
                normalize_text(&survey.description),
                survey.survey_type().code(),
                survey.status.code(),
            ],
        )?;
        for (position, option) in survey.options().iter().enumerate() {
            insert_option(&tx, survey.id, option, position)?;
        }
        for (position, spec) in survey.specifications.iter().enumerate() {
            insert_specification(&tx, survey.id, spec, position)?;
        }
        tx.commit()?;

        Ok(survey.id)
    }

    fn get_survey(&self, id: SurveyId) -> RepoResult<Option<Survey>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, title, description, type, status
             FROM surveys
             WHERE id = ?1;",
        )?;
        let Some(header) = stmt
            .query_row([id.to_string()], |row| Ok(parse_survey_header(row)))
            .optional()?
            .transpose()?
        else {
            return Ok(None);
        };

        let options = load_options(self.conn, id)?;
        let kind = match header.survey_type {
            SurveyType::List => SurveyKind::List(options),
            SurveyType::Boolean if options.is_empty() => SurveyKind::Boolean,
            SurveyType::Boolean => {
                return Err(RepoError::InvalidData(format!(
                    "boolean survey {id} has stored options"
                )));
            }
        };

        Ok(Some(Survey {
            id,
            owner_id: header.owner_id,
            title: header.title,
            description: header.description,
            status: header.status,
            kind,
            specifications: load_specifications(self.conn, id)?,
        }))
    }

    fn find_open_survey_by_title(
        &self,
        owner_id: UserId,
        title: &str,
    ) -> RepoResult<Option<SurveyId>> {
        let id_text: Option<String> = self
            .conn
            .query_row(
                "SELECT id
                 FROM surveys
                 WHERE user_id = ?1
                   AND normalized_title = ?2
                   AND status != 'C'
                 LIMIT 1;",
                params![owner_id.to_string(), normalize_text(title)],
                |row| row.get(0),
            )
            .optional()?;

        id_text
            .map(|value| parse_uuid(&value, "surveys.id"))
            .transpose()
    }

    fn update_survey(&self, survey: &Survey, options: Option<&[String]>) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE surveys
             SET
                title = ?1,
                normalized_title = ?2,
                description = ?3,
                normalized_description = ?4,
                type = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6;",
            params![
                survey.title.as_str(),
                normalize_text(&survey.title),
                survey.description.as_str(),
                normalize_text(&survey.description),
                survey.survey_type().code(),
                survey.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found(survey.id));
        }

        if let Some(labels) = options {
            let removed = tx.execute(
                "DELETE FROM survey_options WHERE survey_id = ?1;",
                [survey.id.to_string()],
            )?;
            for (position, label) in labels.iter().enumerate() {
                let option = SurveyOption::new(survey.id, label.as_str());
                insert_option(&tx, survey.id, &option, position)?;
            }
            debug!(
                "event=options_replace module=repo status=ok \
                 survey_id={} removed={removed} inserted={}",
                survey.id,
                labels.len()
            );
        }
        tx.commit()?;

        Ok(())
    }

    fn replace_specifications(
        &self,
        survey_id: SurveyId,
        specs: &[Specification],
    ) -> RepoResult<Vec<Specification>> {
        for spec in specs {
            spec.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        if !survey_exists(&tx, survey_id)? {
            return Err(not_found(survey_id));
        }

        tx.execute(
            "DELETE FROM survey_specifications WHERE survey_id = ?1;",
            [survey_id.to_string()],
        )?;
        let stored: Vec<Specification> = specs
            .iter()
            .map(|spec| Specification {
                survey_id,
                ..spec.clone()
            })
            .collect();
        for (position, spec) in stored.iter().enumerate() {
            insert_specification(&tx, survey_id, spec, position)?;
        }
        tx.commit()?;

        Ok(stored)
    }

    fn set_status(&self, survey_id: SurveyId, status: SurveyStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE surveys
             SET status = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![status.code(), survey_id.to_string()],
        )?;

        if changed == 0 {
            return Err(not_found(survey_id));
        }
        Ok(())
    }

    fn delete_survey(&self, survey_id: SurveyId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM surveys WHERE id = ?1;", [survey_id.to_string()])?;

        if changed == 0 {
            return Err(not_found(survey_id));
        }
        Ok(())
    }
}

struct SurveyHeader {
    owner_id: UserId,
    title: String,
    description: String,
    survey_type: SurveyType,
    status: SurveyStatus,
}

fn parse_survey_header(row: &Row<'_>) -> RepoResult<SurveyHeader> {
    let owner_text: String = row.get("user_id")?;
    let type_text: String = row.get("type")?;
    let status_text: String = row.get("status")?;

    Ok(SurveyHeader {
        owner_id: parse_uuid(&owner_text, "surveys.user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        survey_type: SurveyType::parse(&type_text).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid survey type `{type_text}` in surveys.type"))
        })?,
        status: SurveyStatus::from_code(&status_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid survey status `{status_text}` in surveys.status"
            ))
        })?,
    })
}

fn load_options(conn: &Connection, survey_id: SurveyId) -> RepoResult<Vec<SurveyOption>> {
    let mut stmt = conn.prepare(
        "SELECT id, label
         FROM survey_options
         WHERE survey_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([survey_id.to_string()])?;
    let mut options = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        options.push(SurveyOption {
            id: parse_uuid(&id_text, "survey_options.id")?,
            survey_id,
            label: row.get("label")?,
        });
    }
    Ok(options)
}

fn load_specifications(
    conn: &Connection,
    survey_id: SurveyId,
) -> RepoResult<Vec<Specification>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, value, weight
         FROM survey_specifications
         WHERE survey_id = ?1
         ORDER BY position ASC, id ASC;",
    )?;
    let mut rows = stmt.query([survey_id.to_string()])?;
    let mut specs = Vec::new();
    while let Some(row) = rows.next()? {
        let id_text: String = row.get("id")?;
        let kind_text: String = row.get("kind")?;
        let kind = SpecificationKind::parse(&kind_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid specification kind `{kind_text}` in survey_specifications.kind"
            ))
        })?;
        specs.push(Specification {
            id: parse_uuid(&id_text, "survey_specifications.id")?,
            survey_id,
            kind,
            value: row.get("value")?,
            weight: row.get("weight")?,
        });
    }
    Ok(specs)
}

fn insert_option(
    conn: &Connection,
    survey_id: SurveyId,
    option: &SurveyOption,
    position: usize,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO survey_options (id, survey_id, label, position) VALUES (?1, ?2, ?3, ?4);",
        params![
            option.id.to_string(),
            survey_id.to_string(),
            option.label.as_str(),
            position_to_db(position),
        ],
    )?;
    Ok(())
}

fn insert_specification(
    conn: &Connection,
    survey_id: SurveyId,
    spec: &Specification,
    position: usize,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO survey_specifications (id, survey_id, kind, value, weight, position)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        params![
            spec.id.to_string(),
            survey_id.to_string(),
            spec.kind.code(),
            spec.value.as_str(),
            spec.weight,
            position_to_db(position),
        ],
    )?;
    Ok(())
}

fn survey_exists(conn: &Connection, survey_id: SurveyId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM surveys WHERE id = ?1);",
        [survey_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn normalize_text(value: &str) -> String {
    value.trim().to_lowercase()
}

fn position_to_db(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}

fn not_found(id: SurveyId) -> RepoError {
    RepoError::NotFound { entity: "survey", id }
}
