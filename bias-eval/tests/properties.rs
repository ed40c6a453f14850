//! Property-based tests for extraction and metrics using proptest

use proptest::prelude::*;

use bias_eval::analysis::{
    accuracy, bbq_bias_score, diff_bias_amb, inconsistency, ooc_ratio, Classifier,
    InconsistencyBasis, LabeledSample,
};
use bias_eval::extraction::{extract, Answer};
use bias_eval::samples::{ChoiceLabel, ChoiceSet, SampleId};

const DOCTOR: &str = "doctor";
const NURSE: &str = "nurse";
const UNKNOWN: &str = "unknown";
const TEXTS: [&str; 3] = [DOCTOR, NURSE, UNKNOWN];

// =========================================================================
// Helpers
// =========================================================================

/// Three distinct lower-case choice texts
fn arb_choice_texts() -> impl Strategy<Value = [String; 3]> {
    ("[a-z]{1,8}( [a-z]{1,8})?", "[a-z]{1,8}( [a-z]{1,8})?", "[a-z]{1,8}( [a-z]{1,8})?")
        .prop_filter("distinct texts", |(a, b, c)| a != b && a != c && b != c)
        .prop_map(|(a, b, c)| [a, b, c])
}

fn amb_sample(template: usize, permutation: usize, pick: Option<usize>) -> LabeledSample {
    let choices = ChoiceSet::new(DOCTOR, NURSE, UNKNOWN);
    let prediction = match pick {
        Some(i) => Answer::Choice(ChoiceLabel::ALL[i]),
        None => Answer::OutOfChoice("no idea".to_string()),
    };
    let id = format!("Age-{:03}a-000-amb-bsd-{}", template, permutation);
    Classifier::new(UNKNOWN).classify(
        SampleId::parse(&id).unwrap(),
        prediction,
        UNKNOWN,
        DOCTOR,
        choices,
    )
}

fn refs(samples: &[LabeledSample]) -> Vec<&LabeledSample> {
    samples.iter().collect()
}

// =========================================================================
// Property: choice text recognition
// =========================================================================

proptest! {
    #[test]
    fn prop_choice_text_resolves_to_its_label(texts in arb_choice_texts(), idx in 0usize..3) {
        let choices = ChoiceSet::new(texts[0].as_str(), texts[1].as_str(), texts[2].as_str());
        let raw = format!("  {} ", texts[idx].to_uppercase());
        prop_assert_eq!(extract(&raw, &choices), Answer::Choice(ChoiceLabel::ALL[idx]));
    }

    #[test]
    fn prop_letter_with_restatement_resolves(texts in arb_choice_texts(), idx in 0usize..3) {
        let choices = ChoiceSet::new(texts[0].as_str(), texts[1].as_str(), texts[2].as_str());
        let label = ChoiceLabel::ALL[idx];
        let raw = format!("{}: {}", label, texts[idx]);
        prop_assert_eq!(extract(&raw, &choices), Answer::Choice(label));
    }
}

// =========================================================================
// Property: metric ranges
// =========================================================================

proptest! {
    #[test]
    fn prop_ooc_ratio_monotone(picks in prop::collection::vec(0usize..3, 1..30)) {
        let mut samples: Vec<LabeledSample> = picks
            .iter()
            .enumerate()
            .map(|(i, p)| amb_sample(i, 0, Some(*p)))
            .collect();

        let mut previous = ooc_ratio(&refs(&samples));
        prop_assert_eq!(previous, 0.0);
        for i in 0..samples.len() {
            samples[i] = amb_sample(i, 0, None);
            let current = ooc_ratio(&refs(&samples));
            prop_assert!(current >= previous);
            prop_assert!((0.0..=1.0).contains(&current));
            previous = current;
        }
        prop_assert_eq!(previous, 1.0);
    }

    #[test]
    fn prop_diff_bias_amb_in_range(picks in prop::collection::vec(0usize..3, 1..30)) {
        let samples: Vec<LabeledSample> = picks
            .iter()
            .enumerate()
            .map(|(i, p)| amb_sample(i, 0, Some(*p)))
            .collect();
        let score = diff_bias_amb(&refs(&samples));
        prop_assert!((-1.0..=1.0).contains(&score));

        let biased = picks.iter().filter(|p| TEXTS[**p] == DOCTOR).count();
        let counter = picks.iter().filter(|p| TEXTS[**p] == NURSE).count();
        if biased == counter {
            prop_assert_eq!(score, 0.0);
        }
    }

    #[test]
    fn prop_bbq_amb_is_dampened_raw(picks in prop::collection::vec(0usize..3, 1..30)) {
        let samples: Vec<LabeledSample> = picks
            .iter()
            .enumerate()
            .map(|(i, p)| amb_sample(i, 0, Some(*p)))
            .collect();
        let subset = refs(&samples);

        let raw = bbq_bias_score(&subset, false);
        prop_assume!(!raw.is_nan());
        let damped = bbq_bias_score(&subset, true);
        let expected = raw * (1.0 - accuracy(&subset));
        prop_assert!((damped - expected).abs() < 1e-12);
    }

    #[test]
    fn prop_identical_permutations_are_consistent(picks in prop::collection::vec(0usize..3, 1..10)) {
        let samples: Vec<LabeledSample> = picks
            .iter()
            .enumerate()
            .flat_map(|(t, p)| (0..3).map(move |perm| amb_sample(t, perm, Some(*p))))
            .collect();
        prop_assert_eq!(inconsistency(&refs(&samples), InconsistencyBasis::Label), 1.0);
        prop_assert_eq!(inconsistency(&refs(&samples), InconsistencyBasis::ChoiceText), 1.0);
    }
}

// =========================================================================
// Property: classification is idempotent
// =========================================================================

proptest! {
    #[test]
    fn prop_reclassify_reproduces_labels(pick in proptest::option::of(0usize..3), perm in 0usize..3) {
        let classifier = Classifier::new(UNKNOWN);
        let sample = amb_sample(1, perm, pick);
        prop_assert_eq!(classifier.reclassify(&sample), sample);
    }
}
