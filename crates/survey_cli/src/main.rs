//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `survey_core` linkage, configuration and database bootstrap.
//! - Print a closed survey's summary as JSON for quick local checks.

use log::error;
use std::process::ExitCode;
use survey_core::db::migrations::latest_version;
use survey_core::db::open_db;
use survey_core::{
    core_version, init_logging_from_config, CoreConfig, SqliteAnswerRepository,
    SqliteSurveyRepository, SummarizeRequest, SummaryService,
};

const USAGE: &str = "usage: survey_cli [summarize <survey_id> <user_id>]";

fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    if let Err(err) = init_logging_from_config(&config) {
        eprintln!("logging init failed: {err}");
        return ExitCode::FAILURE;
    }

    println!("survey_core version={}", core_version());
    println!("survey_core schema_version={}", latest_version());

    let conn = match open_db(&config.database_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!(
                "failed to open `{}`: {err}",
                config.database_path.display()
            );
            return ExitCode::FAILURE;
        }
    };
    println!("survey_core database={}", config.database_path.display());

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [command, survey_id, user_id] if command == "summarize" => {
            let service = SummaryService::new(
                SqliteSurveyRepository::new(&conn),
                SqliteAnswerRepository::new(&conn),
            );
            let request = SummarizeRequest {
                survey_id: survey_id.clone(),
                user_id: user_id.clone(),
            };
            let rendered = service
                .summarize(&request)
                .map_err(|err| err.to_string())
                .and_then(|summary| {
                    serde_json::to_string_pretty(&summary).map_err(|err| err.to_string())
                });
            match rendered {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    error!("event=cli_summarize module=cli status=error error={err}");
                    eprintln!("{err}");
                    ExitCode::FAILURE
                }
            }
        }
        _ => {
            eprintln!("{USAGE}");
            ExitCode::from(2)
        }
    }
}
