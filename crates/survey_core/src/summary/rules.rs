//! Specification normalization.
//!
//! Splits raw specifications into gender rules and age rules, orders the age
//! rules by breakpoint and closes the age interval at both ends.
//!
//! # Invariants
//! - Non-empty age rules always start at `MIN_AGE_BREAKPOINT` and end at
//!   `MAX_AGE_BREAKPOINT`, and are non-decreasing by breakpoint.
//! - Empty age input yields empty age rules (no age weighting).

use crate::model::specification::{
    parse_age_breakpoint, validate_weight, Specification, SpecificationKind, MAX_AGE_BREAKPOINT,
    MIN_AGE_BREAKPOINT,
};
use crate::model::user::Gender;
use crate::summary::{SummaryError, SummaryResult};

/// Multiplier applied to respondents of one gender.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenderRule {
    pub gender: Gender,
    pub weight: f64,
}

/// Weight defined at one age breakpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeRule {
    pub breakpoint: u32,
    pub weight: f64,
}

impl AgeRule {
    fn boundary(breakpoint: u32) -> Self {
        Self {
            breakpoint,
            weight: 0.0,
        }
    }
}

/// Validated, ordered rule sets for one survey.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRules {
    gender: Vec<GenderRule>,
    age: Vec<AgeRule>,
}

impl NormalizedRules {
    pub fn gender_rules(&self) -> &[GenderRule] {
        &self.gender
    }

    pub fn age_rules(&self) -> &[AgeRule] {
        &self.age
    }

    pub fn is_empty(&self) -> bool {
        self.gender.is_empty() && self.age.is_empty()
    }
}

/// Builds normalized rule sets from raw specifications.
///
/// Age rules sharing a breakpoint keep their input order.
pub fn normalize_specifications(specs: &[Specification]) -> SummaryResult<NormalizedRules> {
    let mut gender = Vec::new();
    let mut age = Vec::new();

    for spec in specs {
        validate_weight(spec.weight).map_err(|err| invalid_rule(spec, err.to_string()))?;
        match spec.kind {
            SpecificationKind::Gender => {
                let value = Gender::parse(&spec.value).ok_or_else(|| {
                    invalid_rule(spec, format!("`{}` is not a gender code", spec.value))
                })?;
                gender.push(GenderRule {
                    gender: value,
                    weight: spec.weight,
                });
            }
            SpecificationKind::Age => {
                let breakpoint = parse_age_breakpoint(&spec.value).ok_or_else(|| {
                    invalid_rule(spec, format!("`{}` is not an age breakpoint", spec.value))
                })?;
                age.push(AgeRule {
                    breakpoint,
                    weight: spec.weight,
                });
            }
        }
    }

    Ok(NormalizedRules {
        gender,
        age: close_age_interval(age),
    })
}

fn close_age_interval(mut rules: Vec<AgeRule>) -> Vec<AgeRule> {
    if rules.is_empty() {
        return rules;
    }

    rules.sort_by_key(|rule| rule.breakpoint);

    if rules.first().map(|rule| rule.breakpoint) != Some(MIN_AGE_BREAKPOINT) {
        rules.insert(0, AgeRule::boundary(MIN_AGE_BREAKPOINT));
    }
    if rules.last().map(|rule| rule.breakpoint) != Some(MAX_AGE_BREAKPOINT) {
        rules.push(AgeRule::boundary(MAX_AGE_BREAKPOINT));
    }
    rules
}

fn invalid_rule(spec: &Specification, message: String) -> SummaryError {
    SummaryError::InvalidRule {
        specification_id: spec.id,
        message,
    }
}
