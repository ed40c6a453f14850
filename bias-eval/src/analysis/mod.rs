//! Labeling and bias statistics

pub mod aggregator;
pub mod classifier;
pub mod metrics;

pub use aggregator::{
    AggregatedResults, Aggregator, Granularity, ResultRow, SkippedGroup, OVERALL_GROUP,
};
pub use classifier::{
    AnswerType, BiasAlignment, Classifier, ContextType, Correctness, LabeledSample,
};
pub use metrics::{
    accuracy, bbq_bias_score, diff_bias_amb, diff_bias_dis, inconsistency, ooc_ratio,
    InconsistencyBasis, MetricCalculator, MetricVector,
};
