//! Bias benchmark answer extraction and scoring
//!
//! This crate scores language-model answers on multiple-choice social bias
//! benchmarks (KoBBQ / BBQ style). It recovers a discrete choice from each
//! free-text answer and aggregates the choices into accuracy and bias
//! statistics per category, annotation label and template.
//!
//! # Features
//!
//! - Layered answer extraction (letter, restated choice, emphasis, lead-in,
//!   quotes, letter markers) with an out-of-choice audit log
//! - Structured sample identifiers validated at ingestion
//! - Out-of-choice ratio, inconsistency across permutations, accuracy,
//!   diff-bias and BBQ bias scores for ambiguous and disambiguated contexts
//! - Quick (direct) and full (template-averaged) aggregation
//! - Fixed-header TSV results table and JSON summary
//!
//! # Example
//!
//! ```no_run
//! use bias_eval::{
//!     analysis::{Aggregator, Classifier, Granularity, MetricCalculator},
//!     extraction::extract,
//!     samples::{ChoiceSet, SampleId},
//! };
//!
//! let choices = ChoiceSet::new("의사", "간호사", "알 수 없음");
//! let answer = extract("B: 간호사", &choices);
//!
//! let classifier = Classifier::new("알 수 없음");
//! let sample = classifier.classify(
//!     SampleId::parse("Age-001b-000-dis-bsd-0").unwrap(),
//!     answer,
//!     "간호사",
//!     "의사",
//!     choices,
//! );
//!
//! let aggregator = Aggregator::new(MetricCalculator::default(), Granularity::Quick);
//! let results = aggregator.aggregate("my-model", &[sample]);
//! println!("{} rows", results.rows.len());
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod extraction;
pub mod reporting;
pub mod runner;
pub mod samples;

pub use config::Config;
pub use error::{EvalError, EvalResult};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::analysis::{
        AggregatedResults, Aggregator, Classifier, Granularity, InconsistencyBasis,
        LabeledSample, MetricCalculator, MetricVector, ResultRow,
    };
    pub use crate::config::{Config, Language};
    pub use crate::error::{EvalError, EvalResult};
    pub use crate::extraction::{extract, extract_detailed, Answer, Strategy};
    pub use crate::reporting::{print_console_report, JsonSummary, OocSink, TsvOocLog, TsvWriter};
    pub use crate::runner::{extract_file, Evaluator, Postprocessor};
    pub use crate::samples::{ChoiceLabel, ChoiceSet, EvaluationRecord, RawPrediction, SampleId};
}
