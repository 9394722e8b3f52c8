use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::BTreeMap;
use survey_core::summary::weight::{age_factor, gender_factor};
use survey_core::summary::{
    normalize_specifications, respondent_weight, summarize_survey, RespondentProfile,
};
use survey_core::{
    Answer, Gender, Respondent, RespondentAnswer, Specification, SpecificationKind, Survey,
    SurveyKind,
};
use uuid::Uuid;

fn age_specs(breakpoints: &BTreeMap<u32, f64>) -> Vec<Specification> {
    breakpoints
        .iter()
        .map(|(age, weight)| {
            Specification::new(Uuid::nil(), SpecificationKind::Age, age.to_string(), *weight)
        })
        .collect()
}

fn gender_strategy() -> impl Strategy<Value = Gender> {
    prop_oneof![Just(Gender::Male), Just(Gender::Female)]
}

type RespondentRow = (Gender, i32, bool);

fn respondent_answers(survey: &Survey, rows: &[RespondentRow]) -> Vec<RespondentAnswer> {
    rows.iter()
        .map(|(gender, age, value)| RespondentAnswer {
            answer: Answer::new(survey.id, Uuid::new_v4(), value.to_string()),
            respondent: Respondent {
                gender: *gender,
                birthdate: NaiveDate::from_ymd_opt(2024 - age, 1, 1).unwrap(),
            },
        })
        .collect()
}

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Respondent rows paired with a shuffled copy of the same rows.
fn shuffled_rows() -> impl Strategy<Value = (Vec<RespondentRow>, Vec<RespondentRow>)> {
    prop::collection::vec((gender_strategy(), 0i32..=150, any::<bool>()), 0..40)
        .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
}

proptest! {
    #[test]
    fn normalized_age_rules_span_the_full_range_in_order(
        breakpoints in prop::collection::btree_map(0u32..=150, 0.0f64..10.0, 1..8)
    ) {
        let rules = normalize_specifications(&age_specs(&breakpoints)).unwrap();
        let ages: Vec<u32> = rules.age_rules().iter().map(|rule| rule.breakpoint).collect();

        prop_assert_eq!(ages.first().copied(), Some(0));
        prop_assert_eq!(ages.last().copied(), Some(150));
        prop_assert!(ages.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn every_age_in_range_gets_a_non_negative_weight(
        breakpoints in prop::collection::btree_map(0u32..=150, 0.0f64..10.0, 1..8),
        age in 0u32..=150,
    ) {
        let rules = normalize_specifications(&age_specs(&breakpoints)).unwrap();
        let weight = age_factor(age, rules.age_rules()).unwrap();
        prop_assert!(weight >= 0.0);
        prop_assert!(weight.is_finite());
    }

    #[test]
    fn breakpoint_hits_return_the_configured_weight(
        breakpoints in prop::collection::btree_map(1u32..150, 0.0f64..10.0, 1..8),
    ) {
        let rules = normalize_specifications(&age_specs(&breakpoints)).unwrap();
        for (age, weight) in &breakpoints {
            prop_assert_eq!(age_factor(*age, rules.age_rules()).unwrap(), *weight);
        }
    }

    #[test]
    fn specification_order_does_not_change_weights(
        breakpoints in prop::collection::btree_map(1u32..150, 0.0f64..10.0, 0..8),
        female_weight in 0.0f64..5.0,
        gender in gender_strategy(),
        age in 0u32..=150,
    ) {
        let mut specs = age_specs(&breakpoints);
        specs.push(Specification::new(
            Uuid::nil(),
            SpecificationKind::Gender,
            "F",
            female_weight,
        ));
        let forward = normalize_specifications(&specs).unwrap();
        specs.reverse();
        let backward = normalize_specifications(&specs).unwrap();

        let profile = RespondentProfile { gender, age };
        prop_assert_eq!(
            respondent_weight(profile, &forward).unwrap(),
            respondent_weight(profile, &backward).unwrap()
        );
    }

    #[test]
    fn genders_without_rules_are_neutral(weight in 0.0f64..10.0) {
        let rules = normalize_specifications(&[Specification::new(
            Uuid::nil(),
            SpecificationKind::Gender,
            "M",
            weight,
        )])
        .unwrap();
        prop_assert_eq!(gender_factor(Gender::Female, rules.gender_rules()), 1.0);
    }

    #[test]
    fn without_specifications_weighted_totals_equal_raw_counts(
        rows in prop::collection::vec((gender_strategy(), 0i32..=150, any::<bool>()), 0..40)
    ) {
        let survey = Survey::new_draft(Uuid::new_v4(), "Poll", "d", SurveyKind::Boolean);
        let answers = respondent_answers(&survey, &rows);

        let summary = summarize_survey(&survey, &answers, reference_date()).unwrap();

        let total: u64 = summary.results.iter().map(|entry| entry.raw_count).sum();
        prop_assert_eq!(total, answers.len() as u64);
        for entry in &summary.results {
            prop_assert_eq!(entry.weighted_total, entry.raw_count as f64);
        }
    }

    #[test]
    fn answer_order_does_not_change_the_summary(
        breakpoints in prop::collection::btree_map(0u32..=150, 0.01f64..10.0, 1..8),
        female_weight in 0.01f64..5.0,
        male_weight in 0.01f64..5.0,
        (rows, shuffled) in shuffled_rows(),
    ) {
        let mut survey = Survey::new_draft(Uuid::new_v4(), "Poll", "d", SurveyKind::Boolean);
        survey.specifications = age_specs(&breakpoints);
        survey.specifications.push(Specification::new(
            survey.id,
            SpecificationKind::Gender,
            "F",
            female_weight,
        ));
        survey.specifications.push(Specification::new(
            survey.id,
            SpecificationKind::Gender,
            "M",
            male_weight,
        ));

        let original = summarize_survey(
            &survey,
            &respondent_answers(&survey, &rows),
            reference_date(),
        )
        .unwrap();
        let permuted = summarize_survey(
            &survey,
            &respondent_answers(&survey, &shuffled),
            reference_date(),
        )
        .unwrap();

        prop_assert_eq!(original.results, permuted.results);
    }
}
