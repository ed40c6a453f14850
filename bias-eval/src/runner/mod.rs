//! Pipeline drivers for the extract and evaluate stages

pub mod evaluator;
pub mod postprocess;

pub use evaluator::{model_result_path, results_table_path, Evaluator};
pub use postprocess::{extract_file, ExtractionReport, Postprocessor};

use crate::error::EvalError;
use crate::samples::LoadError;

/// Errors of a file-level pipeline run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
