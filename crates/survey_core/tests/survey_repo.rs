use chrono::NaiveDate;
use rusqlite::Connection;
use survey_core::db::open_db_in_memory;
use survey_core::{
    Answer, AnswerRepository, Gender, RepoError, Specification, SpecificationKind,
    SqliteAnswerRepository, SqliteSurveyRepository, SqliteUserRepository, Survey, SurveyKind,
    SurveyOption, SurveyRepository, SurveyStatus, User, UserRepository,
};
use uuid::Uuid;

fn seed_user(conn: &Connection, email: &str) -> User {
    let user = User::new(
        email,
        Gender::Female,
        NaiveDate::from_ymd_opt(1990, 4, 2).unwrap(),
    );
    SqliteUserRepository::new(conn).create_user(&user).unwrap();
    user
}

fn list_survey(owner: &User, title: &str, labels: &[&str]) -> Survey {
    let mut survey = Survey::new_draft(owner.id, title, "description", SurveyKind::Boolean);
    survey.kind = SurveyKind::List(
        labels
            .iter()
            .map(|label| SurveyOption::new(survey.id, *label))
            .collect(),
    );
    survey
}

#[test]
fn create_and_get_roundtrip_loads_children_in_order() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);

    let mut survey = list_survey(&owner, "Colors", &["Red", "Blue", "Green"]);
    survey.specifications = vec![
        Specification::new(survey.id, SpecificationKind::Age, "40", 1.5),
        Specification::new(survey.id, SpecificationKind::Gender, "F", 2.0),
    ];
    repo.create_survey(&survey).unwrap();

    let loaded = repo.get_survey(survey.id).unwrap().unwrap();
    assert_eq!(loaded, survey);
    let labels: Vec<_> = loaded.options().iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["Red", "Blue", "Green"]);
}

#[test]
fn get_missing_survey_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSurveyRepository::new(&conn);
    assert!(repo.get_survey(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn update_with_labels_swaps_the_whole_option_set() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let survey = list_survey(&owner, "Colors", &["Red", "Blue"]);
    repo.create_survey(&survey).unwrap();

    let labels = vec!["Red".to_string(), "Teal".to_string()];
    repo.update_survey(&survey, Some(labels.as_slice())).unwrap();

    let loaded = repo.get_survey(survey.id).unwrap().unwrap();
    let stored: Vec<_> = loaded.options().iter().map(|o| o.label.as_str()).collect();
    assert_eq!(stored, vec!["Red", "Teal"]);
    assert!(loaded
        .options()
        .iter()
        .all(|option| survey.find_option(option.id).is_none()));
}

#[test]
fn update_without_labels_keeps_option_ids() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let mut survey = list_survey(&owner, "Colors", &["Red", "Blue"]);
    repo.create_survey(&survey).unwrap();

    survey.description = "Updated".to_string();
    repo.update_survey(&survey, None).unwrap();

    assert_eq!(repo.get_survey(survey.id).unwrap().unwrap(), survey);
}

#[test]
fn failed_option_replace_rolls_back_the_detail_update() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let survey = list_survey(&owner, "Colors", &["A", "B"]);
    repo.create_survey(&survey).unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_option_delete BEFORE DELETE ON survey_options
         BEGIN SELECT RAISE(ABORT, 'option delete rejected'); END;",
    )
    .unwrap();

    let mut boolean = survey.clone();
    boolean.kind = SurveyKind::Boolean;
    assert!(repo.update_survey(&boolean, Some(&[][..])).is_err());

    assert_eq!(repo.get_survey(survey.id).unwrap().unwrap(), survey);
}

#[test]
fn update_of_missing_survey_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let survey = list_survey(&owner, "Colors", &["Red", "Blue"]);

    let err = repo.update_survey(&survey, None).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "survey", .. }));
}

#[test]
fn replace_specifications_rejects_invalid_rules_without_touching_storage() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let mut survey = Survey::new_draft(owner.id, "Yes or no", "d", SurveyKind::Boolean);
    survey.specifications = vec![Specification::new(
        survey.id,
        SpecificationKind::Gender,
        "M",
        1.0,
    )];
    repo.create_survey(&survey).unwrap();

    let bad = vec![Specification::new(
        survey.id,
        SpecificationKind::Age,
        "151",
        1.0,
    )];
    let err = repo.replace_specifications(survey.id, &bad).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let loaded = repo.get_survey(survey.id).unwrap().unwrap();
    assert_eq!(loaded.specifications, survey.specifications);
}

#[test]
fn find_open_survey_by_title_ignores_case_and_closed_surveys() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let survey = Survey::new_draft(owner.id, "Lunch Poll", "d", SurveyKind::Boolean);
    repo.create_survey(&survey).unwrap();

    assert_eq!(
        repo.find_open_survey_by_title(owner.id, "  lunch poll ")
            .unwrap(),
        Some(survey.id)
    );

    repo.set_status(survey.id, SurveyStatus::Published).unwrap();
    repo.set_status(survey.id, SurveyStatus::Closed).unwrap();
    assert_eq!(
        repo.find_open_survey_by_title(owner.id, "Lunch Poll").unwrap(),
        None
    );
}

#[test]
fn deleting_a_survey_cascades_to_children() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let respondent = seed_user(&conn, "respondent@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let answers = SqliteAnswerRepository::new(&conn);

    let mut survey = list_survey(&owner, "Colors", &["Red", "Blue"]);
    survey.specifications = vec![Specification::new(
        survey.id,
        SpecificationKind::Age,
        "30",
        1.0,
    )];
    repo.create_survey(&survey).unwrap();
    let choice = survey.options()[0].id.to_string();
    answers
        .create_answer(&Answer::new(survey.id, respondent.id, choice))
        .unwrap();

    repo.delete_survey(survey.id).unwrap();

    for table in ["survey_options", "survey_specifications", "survey_answers"] {
        let remaining: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {table} WHERE survey_id = ?1;"),
                [survey.id.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(remaining, 0, "{table} rows survived survey delete");
    }
}

#[test]
fn duplicate_answer_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let owner = seed_user(&conn, "owner@example.com");
    let repo = SqliteSurveyRepository::new(&conn);
    let answers = SqliteAnswerRepository::new(&conn);
    let survey = Survey::new_draft(owner.id, "Yes or no", "d", SurveyKind::Boolean);
    repo.create_survey(&survey).unwrap();

    answers
        .create_answer(&Answer::new(survey.id, owner.id, "true"))
        .unwrap();
    let err = answers
        .create_answer(&Answer::new(survey.id, owner.id, "false"))
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict(_)));

    let listed = answers.list_answers_with_respondents(survey.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].respondent.gender, Gender::Female);
    assert_eq!(listed[0].answer.value, "true");
}
