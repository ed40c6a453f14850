//! Matcher and narrowing strategies used by the extractor
//!
//! Matchers look at one candidate text and either resolve a label or pass.
//! Narrowers cut a shorter excerpt out of the raw text for a nested attempt.

use std::sync::LazyLock;

use regex::Regex;

use super::Strategy;
use crate::samples::{ChoiceLabel, ChoiceSet};

/// Polite sentence endings rewritten before matching, in application order
const POLITE_FORMS: &[(&str, &str)] = &[("없습니다", "없음"), ("입니다", "")];

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\*\*['"]?([^.\n*'"]*)"#).expect("emphasis pattern"));

static LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:답변?[은:]|(?i:the\s+answer\s+is)\s*:?)\s*['"]?([^.\n*'"]*)"#)
        .expect("lead-in pattern")
});

static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"['"]([^.\n*'"]*)"#).expect("quoted pattern"));

/// Text under examination, with its normalized first sentence
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub raw: &'a str,
    /// Leading sentence: leading whitespace and `(` dropped, cut at the
    /// first `.` or newline, polite endings rewritten
    pub head: String,
    pub head_upper: String,
}

impl<'a> Candidate<'a> {
    pub fn new(raw: &'a str) -> Self {
        let trimmed = raw.trim_start();
        let trimmed = trimmed.strip_prefix('(').unwrap_or(trimmed);
        let end = trimmed
            .find(|c: char| c == '.' || c == '\n')
            .unwrap_or(trimmed.len());

        let mut head = trimmed[..end].to_string();
        for (from, to) in POLITE_FORMS {
            head = head.replace(from, to);
        }
        let head_upper = head.to_uppercase();

        Self {
            raw,
            head,
            head_upper,
        }
    }
}

/// Outcome of a single matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Resolved(ChoiceLabel),
    /// The text names more than one choice; carries the residual
    Ambiguous(String),
    Next,
}

pub type Matcher = fn(&Candidate<'_>, &ChoiceSet) -> Step;
pub type Narrower = fn(&str) -> Option<&str>;

/// Matchers in priority order
pub const MATCHERS: &[(Strategy, Matcher)] = &[
    (Strategy::ExactText, exact_text),
    (Strategy::LetterPrefix, letter_prefix),
    (Strategy::ChoiceText, choice_text),
];

/// Narrowing fallbacks in priority order
pub const NARROWERS: &[(Strategy, Narrower)] = &[
    (Strategy::Emphasis, emphasized),
    (Strategy::LeadIn, after_lead_in),
    (Strategy::Quoted, quoted),
];

/// The whole raw text restates one choice
pub fn exact_text(candidate: &Candidate<'_>, choices: &ChoiceSet) -> Step {
    match choices.label_of(candidate.raw) {
        Some(label) => Step::Resolved(label),
        None => Step::Next,
    }
}

/// The answer opens with a choice letter, optionally followed by `:` or `)`
/// and a restatement of the choice
pub fn letter_prefix(candidate: &Candidate<'_>, choices: &ChoiceSet) -> Step {
    let upper = &candidate.head_upper;
    let Some(label) = upper.chars().next().and_then(ChoiceLabel::from_char) else {
        return Step::Next;
    };

    let restated = upper
        .find(|c: char| c == ':' || c == ')')
        .map(|pos| upper[pos + 1..].trim())
        .filter(|s| !s.is_empty());

    if let Some(restated) = restated {
        if choices.normalized(label) == restated.to_lowercase() {
            return Step::Resolved(label);
        }

        let mentions: usize = ChoiceLabel::ALL
            .iter()
            .map(|l| choices.normalized(*l))
            .filter(|text| !text.is_empty())
            .map(|text| upper.matches(text.to_uppercase().as_str()).count())
            .sum();
        if mentions > 1 {
            return Step::Ambiguous(candidate.head.clone());
        }

        // restatement did not match; trust the letter
        return Step::Resolved(label);
    }

    let letters: usize = ChoiceLabel::ALL
        .iter()
        .map(|l| upper.matches(l.as_char()).count())
        .sum();
    if letters == 1 {
        Step::Resolved(label)
    } else {
        Step::Next
    }
}

/// The leading sentence is one of the choice texts
pub fn choice_text(candidate: &Candidate<'_>, choices: &ChoiceSet) -> Step {
    match choices.label_of(&candidate.head) {
        Some(label) => Step::Resolved(label),
        None => Step::Next,
    }
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Text inside `**bold**` emphasis
pub fn emphasized(raw: &str) -> Option<&str> {
    first_capture(&EMPHASIS, raw)
}

/// Text following "답변은" / "답:" / "the answer is"
pub fn after_lead_in(raw: &str) -> Option<&str> {
    first_capture(&LEAD_IN, raw)
}

/// Text following an opening quote
pub fn quoted(raw: &str) -> Option<&str> {
    first_capture(&QUOTED, raw)
}

/// Exactly one letter written as `X:` or `X)` anywhere in the text
pub fn letter_marker(raw: &str) -> Option<ChoiceLabel> {
    let upper = raw.to_uppercase();
    let mut marked = ChoiceLabel::ALL.into_iter().filter(|l| {
        let c = l.as_char();
        upper.contains(&format!("{}:", c)) || upper.contains(&format!("{})", c))
    });
    let first = marked.next()?;
    match marked.next() {
        Some(_) => None,
        None => Some(first),
    }
}
