//! Benchmark sample records and loading

pub mod choices;
pub mod identifier;
pub mod loader;

pub use choices::{normalize_choice, ChoiceLabel, ChoiceSet};
pub use identifier::{ContextCondition, QuestionType, SampleId, ID_DELIMITER};
pub use loader::{load_raw_predictions, load_records, LoadError, TsvTable};

use serde::{Deserialize, Serialize};

/// One benchmark sample joined with the model's prediction.
///
/// Column names follow the evaluation TSV files: the three presented choices
/// are `A`, `B`, `C`; `prediction` holds either the resolved choice text or
/// the residual text of an out-of-choice answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub sample_id: String,
    #[serde(default)]
    pub label_annotation: Option<String>,
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    pub answer: String,
    pub biased_answer: String,
    #[serde(default)]
    pub prediction: String,
}

impl EvaluationRecord {
    pub fn choices(&self) -> ChoiceSet {
        ChoiceSet::new(self.a.as_str(), self.b.as_str(), self.c.as_str())
    }

    pub fn parse_id(&self) -> crate::error::EvalResult<SampleId> {
        SampleId::parse(&self.sample_id)
    }
}

/// Unprocessed model output for one sample
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrediction {
    pub guid: String,
    #[serde(default)]
    pub raw: String,
}

impl RawPrediction {
    pub fn new(guid: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            guid: guid.into(),
            raw: raw.into(),
        }
    }
}
