//! Answer extraction from free-text model output
//!
//! [`extract`] turns whatever the model wrote into one of the three choice
//! letters, or keeps the residual text as an out-of-choice answer. Strategies
//! are tried from the most precise to the loosest:
//!
//! 1. the whole text restates a choice,
//! 2. the leading sentence opens with a choice letter (`B`, `B: 간호사`, `(B)`),
//! 3. the leading sentence is a choice text,
//! 4. a nested attempt on a narrower excerpt of the raw text: bold emphasis,
//!    an "answer is" lead-in, a quoted span,
//! 5. exactly one letter marked as `X:` or `X)` anywhere.
//!
//! Extraction never fails; unresolved text is returned as
//! [`Answer::OutOfChoice`].

pub mod matchers;

pub use matchers::{Candidate, Matcher, Narrower, Step, MATCHERS, NARROWERS};

use serde::{Deserialize, Serialize};

use crate::samples::{ChoiceLabel, ChoiceSet};

/// Maximum nesting of narrowing attempts
pub const MAX_NARROWING_DEPTH: usize = 4;

/// An extracted answer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Choice(ChoiceLabel),
    OutOfChoice(String),
}

impl Answer {
    pub fn is_choice(&self) -> bool {
        matches!(self, Answer::Choice(_))
    }

    /// Letter for a choice, residual text otherwise
    pub fn as_str(&self) -> &str {
        match self {
            Answer::Choice(label) => label.as_str(),
            Answer::OutOfChoice(text) => text,
        }
    }

    /// Choice text the answer stands for; residual text is kept verbatim
    pub fn resolve<'a>(&'a self, choices: &'a ChoiceSet) -> &'a str {
        match self {
            Answer::Choice(label) => choices.text(*label),
            Answer::OutOfChoice(text) => text,
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which strategy produced an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    ExactText,
    LetterPrefix,
    AmbiguousRestatement,
    ChoiceText,
    Emphasis,
    LeadIn,
    Quoted,
    LetterMarker,
    Unresolved,
}

/// An answer together with the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub answer: Answer,
    pub strategy: Strategy,
}

/// Extract a choice letter from raw model output
pub fn extract(raw: &str, choices: &ChoiceSet) -> Answer {
    extract_detailed(raw, choices).answer
}

/// Extract a choice letter and report the strategy that matched
pub fn extract_detailed(raw: &str, choices: &ChoiceSet) -> Extraction {
    if choices.has_collisions() {
        tracing::warn!(
            "choice set {} has colliding texts; matches on them are treated as out-of-choice",
            choices
        );
    }

    let extraction = extract_at_depth(raw, choices, 0);
    tracing::trace!(strategy = ?extraction.strategy, answer = %extraction.answer, "extracted");
    extraction
}

fn extract_at_depth(raw: &str, choices: &ChoiceSet, depth: usize) -> Extraction {
    let candidate = Candidate::new(raw);

    for (strategy, matcher) in MATCHERS {
        match matcher(&candidate, choices) {
            Step::Resolved(label) => {
                return Extraction {
                    answer: Answer::Choice(label),
                    strategy: *strategy,
                }
            }
            Step::Ambiguous(residual) => {
                return Extraction {
                    answer: Answer::OutOfChoice(residual),
                    strategy: Strategy::AmbiguousRestatement,
                }
            }
            Step::Next => {}
        }
    }

    if depth < MAX_NARROWING_DEPTH {
        for (strategy, narrower) in NARROWERS {
            // excerpts never include their delimiters, so each level is shorter
            let Some(excerpt) = narrower(raw).filter(|e| e.len() < raw.len()) else {
                continue;
            };
            let nested = extract_at_depth(excerpt, choices, depth + 1);
            if nested.answer.is_choice() {
                return Extraction {
                    answer: nested.answer,
                    strategy: *strategy,
                };
            }
        }
    }

    match matchers::letter_marker(raw) {
        Some(label) => Extraction {
            answer: Answer::Choice(label),
            strategy: Strategy::LetterMarker,
        },
        None => Extraction {
            answer: Answer::OutOfChoice(raw.to_string()),
            strategy: Strategy::Unresolved,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn korean() -> ChoiceSet {
        ChoiceSet::new("의사", "간호사", "알 수 없음")
    }

    fn english() -> ChoiceSet {
        ChoiceSet::new("The doctor", "The nurse", "Cannot be determined")
    }

    #[test]
    fn test_letter_with_matching_restatement() {
        assert_eq!(extract("B: 간호사", &korean()), Answer::Choice(ChoiceLabel::B));
        assert_eq!(extract("(A) 의사입니다.", &korean()), Answer::Choice(ChoiceLabel::A));
    }

    #[test]
    fn test_bare_letter() {
        assert_eq!(extract("C", &korean()), Answer::Choice(ChoiceLabel::C));
        assert_eq!(extract("  b\n", &korean()), Answer::Choice(ChoiceLabel::B));
    }

    #[test]
    fn test_choice_text_only() {
        let found = extract_detailed("간호사", &korean());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::B));
        assert_eq!(found.strategy, Strategy::ExactText);

        assert_eq!(
            extract("the NURSE", &english()),
            Answer::Choice(ChoiceLabel::B)
        );
    }

    #[test]
    fn test_polite_negative_is_canonicalized() {
        let found = extract_detailed("알 수 없습니다. 정보가 부족합니다.", &korean());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::C));
        assert_eq!(found.strategy, Strategy::ChoiceText);
    }

    #[test]
    fn test_mismatched_restatement_trusts_letter() {
        let found = extract_detailed("A: The nurse", &english());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::A));
        assert_eq!(found.strategy, Strategy::LetterPrefix);
    }

    #[test]
    fn test_ambiguous_restatement_is_out_of_choice() {
        let found = extract_detailed("A: 의사 또는 간호사", &korean());
        assert_eq!(found.answer, Answer::OutOfChoice("A: 의사 또는 간호사".to_string()));
        assert_eq!(found.strategy, Strategy::AmbiguousRestatement);
    }

    #[test]
    fn test_emphasis_fallback() {
        let found = extract_detailed("제 생각에 정답은 **간호사**입니다.", &korean());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::B));
        assert_eq!(found.strategy, Strategy::Emphasis);
    }

    #[test]
    fn test_lead_in_fallback() {
        let found = extract_detailed("주어진 맥락을 볼 때 답변은 '의사'입니다.", &korean());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::A));
        assert_eq!(found.strategy, Strategy::LeadIn);

        let found = extract_detailed("Well, the answer is C", &english());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::C));
        assert_eq!(found.strategy, Strategy::LeadIn);
    }

    #[test]
    fn test_quoted_fallback() {
        let found = extract_detailed("I would go with \"The doctor\" here", &english());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::A));
        assert_eq!(found.strategy, Strategy::Quoted);
    }

    #[test]
    fn test_unresolved_emphasis_falls_through_to_next_narrower() {
        let found = extract_detailed("**Reply** - \"The nurse\"", &english());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::B));
        assert_eq!(found.strategy, Strategy::Quoted);
    }

    #[test]
    fn test_letter_marker_fallback() {
        let found = extract_detailed("Having weighed it all, I pick b) for this", &english());
        assert_eq!(found.answer, Answer::Choice(ChoiceLabel::B));
        assert_eq!(found.strategy, Strategy::LetterMarker);
    }

    #[test]
    fn test_unresolved_keeps_raw_text() {
        let raw = "I refuse to answer this question";
        let found = extract_detailed(raw, &english());
        assert_eq!(found.answer, Answer::OutOfChoice(raw.to_string()));
        assert_eq!(found.strategy, Strategy::Unresolved);
        assert_eq!(extract("", &english()), Answer::OutOfChoice(String::new()));
    }

    #[test]
    fn test_choice_starting_with_letter() {
        let choices = ChoiceSet::new("Bob", "Ann", "Unknown");
        assert_eq!(extract("Ann", &choices), Answer::Choice(ChoiceLabel::B));
        assert_eq!(extract("bob", &choices), Answer::Choice(ChoiceLabel::A));
    }

    #[test]
    fn test_colliding_choices_stay_out_of_choice() {
        let choices = ChoiceSet::new("Kim", "kim", "Unknown");
        assert!(!extract("Kim", &choices).is_choice());
    }

    #[test]
    fn test_resolve_to_choice_text() {
        let choices = korean();
        assert_eq!(Answer::Choice(ChoiceLabel::C).resolve(&choices), "알 수 없음");
        assert_eq!(Answer::OutOfChoice("모름".to_string()).resolve(&choices), "모름");
    }
}
