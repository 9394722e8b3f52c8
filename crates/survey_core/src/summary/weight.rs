//! Per-respondent weight calculation.
//!
//! Weight = gender factor x age factor. The gender factor multiplies every
//! matching gender rule; the age factor interpolates linearly between the two
//! age breakpoints bracketing the respondent's age.

use crate::model::user::Gender;
use crate::summary::rules::{AgeRule, GenderRule, NormalizedRules};
use crate::summary::{SummaryError, SummaryResult};

/// Respondent attributes the weight depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RespondentProfile {
    pub gender: Gender,
    /// Age in whole years.
    pub age: u32,
}

/// Computes the scalar weight of one respondent.
pub fn respondent_weight(
    profile: RespondentProfile,
    rules: &NormalizedRules,
) -> SummaryResult<f64> {
    if rules.is_empty() {
        return Ok(1.0);
    }
    let gender = gender_factor(profile.gender, rules.gender_rules());
    let age = age_factor(profile.age, rules.age_rules())?;
    Ok(gender * age)
}

/// Product of the weights of all rules matching `gender`; 1 when none match.
pub fn gender_factor(gender: Gender, rules: &[GenderRule]) -> f64 {
    rules
        .iter()
        .filter(|rule| rule.gender == gender)
        .fold(1.0, |factor, rule| factor * rule.weight)
}

/// Interpolated age weight; 1 when there are no age rules.
///
/// An age that lands exactly on a breakpoint returns that breakpoint's weight.
///
/// # Errors
/// - `AgeOutOfRange` when `age` lies outside `[first, last]` breakpoint.
pub fn age_factor(age: u32, rules: &[AgeRule]) -> SummaryResult<f64> {
    let (Some(first), Some(last)) = (rules.first(), rules.last()) else {
        return Ok(1.0);
    };
    if age < first.breakpoint || age > last.breakpoint {
        return Err(SummaryError::AgeOutOfRange {
            age,
            first: first.breakpoint,
            last: last.breakpoint,
        });
    }

    let Some(index) = (1..rules.len()).find(|&idx| age <= rules[idx].breakpoint) else {
        // single breakpoint; the range check above pins `age` to it
        return Ok(first.weight.abs());
    };
    let start = rules[index - 1];
    let end = rules[index];

    if age == end.breakpoint {
        return Ok(end.weight.abs());
    }
    if age == start.breakpoint {
        return Ok(start.weight.abs());
    }
    Ok(interpolate(start, end, age).abs())
}

/// Linear blend between two breakpoints, based at the smaller weight.
///
/// Coincident breakpoints yield `t = 0`.
fn interpolate(start: AgeRule, end: AgeRule, age: u32) -> f64 {
    let span = f64::from(end.breakpoint) - f64::from(start.breakpoint);
    let t = if span == 0.0 {
        0.0
    } else {
        (f64::from(age) - f64::from(start.breakpoint)) / span
    };
    start.weight.min(end.weight) + t * (end.weight - start.weight)
}

#[cfg(test)]
mod tests {
    use super::{age_factor, gender_factor, interpolate, respondent_weight, RespondentProfile};
    use crate::model::specification::{Specification, SpecificationKind};
    use crate::model::user::Gender;
    use crate::summary::rules::{normalize_specifications, AgeRule, GenderRule};
    use crate::summary::SummaryError;
    use uuid::Uuid;

    fn age_rule(breakpoint: u32, weight: f64) -> AgeRule {
        AgeRule { breakpoint, weight }
    }

    fn age_spec(value: &str, weight: f64) -> Specification {
        Specification::new(Uuid::nil(), SpecificationKind::Age, value, weight)
    }

    #[test]
    fn gender_factor_compounds_matching_rules_only() {
        let rules = [
            GenderRule {
                gender: Gender::Female,
                weight: 2.0,
            },
            GenderRule {
                gender: Gender::Female,
                weight: 1.5,
            },
            GenderRule {
                gender: Gender::Male,
                weight: 9.0,
            },
        ];
        assert_eq!(gender_factor(Gender::Female, &rules), 3.0);
        assert_eq!(gender_factor(Gender::Male, &rules[..2]), 1.0);
    }

    #[test]
    fn empty_age_rules_are_neutral() {
        assert_eq!(age_factor(42, &[]).unwrap(), 1.0);
    }

    #[test]
    fn exact_breakpoints_return_their_weight() {
        let rules = normalize_specifications(&[
            age_spec("80", 0.7),
            age_spec("90", 0.3),
            age_spec("100", 0.9),
        ])
        .unwrap();
        let ages = rules.age_rules();
        assert_eq!(age_factor(80, ages).unwrap(), 0.7);
        assert_eq!(age_factor(90, ages).unwrap(), 0.3);
        assert_eq!(age_factor(100, ages).unwrap(), 0.9);
        assert_eq!(age_factor(0, ages).unwrap(), 0.0);
        assert_eq!(age_factor(150, ages).unwrap(), 0.0);
    }

    #[test]
    fn interior_ages_interpolate_linearly() {
        let rules = [age_rule(0, 1.0), age_rule(100, 3.0), age_rule(150, 3.0)];
        assert!((age_factor(50, &rules).unwrap() - 2.0).abs() < 1e-12);
        assert!((age_factor(125, &rules).unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn weight_tapers_towards_synthetic_boundaries() {
        let rules = normalize_specifications(&[age_spec("50", 2.0)]).unwrap();
        assert!((age_factor(25, rules.age_rules()).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_breakpoints_do_not_divide_by_zero() {
        let value = interpolate(age_rule(30, 4.0), age_rule(30, 2.0), 30);
        assert_eq!(value, 2.0);
        let rules = [age_rule(0, 1.0), age_rule(30, 4.0), age_rule(30, 2.0), age_rule(150, 1.0)];
        assert!(age_factor(30, &rules).unwrap().is_finite());
    }

    #[test]
    fn ages_outside_the_rule_range_are_rejected() {
        let rules = [age_rule(0, 1.0), age_rule(150, 1.0)];
        let err = age_factor(151, &rules).unwrap_err();
        assert_eq!(
            err,
            SummaryError::AgeOutOfRange {
                age: 151,
                first: 0,
                last: 150
            }
        );
    }

    #[test]
    fn respondent_weight_multiplies_both_factors() {
        let rules = normalize_specifications(&[
            Specification::new(Uuid::nil(), SpecificationKind::Gender, "F", 2.0),
            age_spec("0", 1.5),
            age_spec("150", 1.5),
        ])
        .unwrap();
        let weight = respondent_weight(
            RespondentProfile {
                gender: Gender::Female,
                age: 60,
            },
            &rules,
        )
        .unwrap();
        assert!((weight - 3.0).abs() < 1e-12);
    }
}
