//! Answer aggregation into per-value summaries.
//!
//! # Invariants
//! - One entry per distinct raw answer value; unanswered options get none.
//! - Results are ordered by raw answer value, independent of answer order.

use crate::model::answer::{parse_boolean_answer, RespondentAnswer};
use crate::model::survey::{OptionId, Survey, SurveyId, SurveyKind};
use crate::model::user::whole_years_between;
use crate::summary::rules::normalize_specifications;
use crate::summary::weight::{respondent_weight, RespondentProfile};
use crate::summary::{SummaryError, SummaryResult};
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Display label of one summary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SummaryLabel {
    Boolean(bool),
    Option(String),
}

/// Tally for one distinct answer value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSummary {
    /// Set for list surveys only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_id: Option<OptionId>,
    pub label: SummaryLabel,
    pub raw_count: u64,
    pub weighted_total: f64,
}

/// Summary of one closed survey.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveySummary {
    pub survey_id: SurveyId,
    pub title: String,
    pub results: Vec<OptionSummary>,
}

/// Summarizes `answers` for `survey`, deriving respondent ages on `reference_date`.
///
/// The caller is responsible for lifecycle and ownership checks.
pub fn summarize_survey(
    survey: &Survey,
    answers: &[RespondentAnswer],
    reference_date: NaiveDate,
) -> SummaryResult<SurveySummary> {
    let rules = normalize_specifications(&survey.specifications)?;
    let labels: HashMap<OptionId, &str> = survey
        .options()
        .iter()
        .map(|option| (option.id, option.label.as_str()))
        .collect();

    let mut entries: BTreeMap<&str, (OptionSummary, Vec<f64>)> = BTreeMap::new();
    for item in answers {
        let key = item.answer.value.as_str();
        let (entry, weights) = match entries.entry(key) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                slot.insert((new_entry(&survey.kind, &labels, key)?, Vec::new()))
            }
        };

        let age = whole_years_between(item.respondent.birthdate, reference_date)
            .ok_or(SummaryError::BirthdateAfterReferenceDate)?;
        let weight = respondent_weight(
            RespondentProfile {
                gender: item.respondent.gender,
                age,
            },
            &rules,
        )?;

        entry.raw_count += 1;
        weights.push(weight);
    }

    debug!(
        "event=summary_aggregate module=summary status=ok survey_id={} answers={} entries={} gender_rules={} age_rules={}",
        survey.id,
        answers.len(),
        entries.len(),
        rules.gender_rules().len(),
        rules.age_rules().len()
    );

    Ok(SurveySummary {
        survey_id: survey.id,
        title: survey.title.clone(),
        results: entries
            .into_values()
            .map(|(mut entry, weights)| {
                entry.weighted_total = order_independent_sum(weights);
                entry
            })
            .collect(),
    })
}

/// Sums weights in ascending order so the total does not depend on answer order.
fn order_independent_sum(mut weights: Vec<f64>) -> f64 {
    weights.sort_by(f64::total_cmp);
    weights.into_iter().sum()
}

fn new_entry(
    kind: &SurveyKind,
    labels: &HashMap<OptionId, &str>,
    value: &str,
) -> SummaryResult<OptionSummary> {
    let (option_id, label) = match kind {
        SurveyKind::Boolean => {
            let parsed = parse_boolean_answer(value)
                .ok_or_else(|| SummaryError::InvalidBooleanAnswer(value.to_string()))?;
            (None, SummaryLabel::Boolean(parsed))
        }
        SurveyKind::List(_) => {
            let option_id = Uuid::parse_str(value)
                .map_err(|_| SummaryError::UnknownOption(value.to_string()))?;
            let label = labels
                .get(&option_id)
                .ok_or_else(|| SummaryError::UnknownOption(value.to_string()))?;
            (Some(option_id), SummaryLabel::Option((*label).to_string()))
        }
    };

    Ok(OptionSummary {
        option_id,
        label,
        raw_count: 0,
        weighted_total: 0.0,
    })
}
