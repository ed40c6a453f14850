//! Error types shared by the evaluation pipeline

use crate::samples::ContextCondition;

/// Errors raised while labeling samples or computing grouped statistics
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("invalid sample id '{sample_id}': {reason}")]
    InvalidSampleId { sample_id: String, reason: String },

    #[error("group '{group}' has no {context} rows")]
    MissingContext {
        group: String,
        context: ContextCondition,
    },

    #[error("group '{group}' has no rows")]
    EmptySlice { group: String },

    #[error("sample '{0}' not found")]
    SampleNotFound(String),

    #[error("sample '{0}' appears more than once")]
    DuplicateSample(String),

    #[error("out-of-choice log write failed: {0}")]
    Sink(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
