//! Evaluation records to results tables

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::PipelineError;
use crate::analysis::{AggregatedResults, Aggregator, Classifier, LabeledSample, MetricCalculator};
use crate::config::{Config, ConfigError};
use crate::error::{EvalError, EvalResult};
use crate::samples::{load_records, EvaluationRecord};

/// Evaluation file of one model: `<dir>/<topic>_<prompt_id>_<model>.tsv`
pub fn model_result_path(dir: impl AsRef<Path>, topic: &str, prompt_id: usize, model: &str) -> PathBuf {
    dir.as_ref()
        .join(format!("{}_{}_{}.tsv", topic, prompt_id, model))
}

/// Results table of one run: `<dir>/<topic>_<prompt_id>.tsv`
pub fn results_table_path(dir: impl AsRef<Path>, topic: &str, prompt_id: usize) -> PathBuf {
    dir.as_ref().join(format!("{}_{}.tsv", topic, prompt_id))
}

/// Labels records and aggregates them into result rows
#[derive(Debug, Clone)]
pub struct Evaluator {
    classifier: Classifier,
    aggregator: Aggregator,
}

impl Evaluator {
    pub fn new(classifier: Classifier, aggregator: Aggregator) -> Self {
        Self {
            classifier,
            aggregator,
        }
    }

    /// Build from the `[evaluation]` section
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let eval = &config.evaluation;
        let classifier = Classifier::new(&config.unknown_answer()?)
            .with_biased_suffixes(eval.biased_suffixes.iter().copied());
        let aggregator = Aggregator::new(
            MetricCalculator::new(eval.inconsistency_basis),
            eval.granularity,
        )
        .with_template_rows(eval.group_by_template);
        Ok(Self::new(classifier, aggregator))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Label every record; an invalid or repeated sample id fails the
    /// whole batch
    pub fn label(&self, records: &[EvaluationRecord]) -> EvalResult<Vec<LabeledSample>> {
        let mut seen = HashSet::with_capacity(records.len());
        records
            .iter()
            .map(|r| {
                if !seen.insert(r.sample_id.as_str()) {
                    return Err(EvalError::DuplicateSample(r.sample_id.clone()));
                }
                self.classifier.classify_record(r)
            })
            .collect()
    }

    /// Results rows of one model
    pub fn evaluate_model(
        &self,
        model: &str,
        records: &[EvaluationRecord],
    ) -> EvalResult<AggregatedResults> {
        let labeled = self.label(records)?;
        tracing::debug!("Labeled {} samples for {}", labeled.len(), model);
        Ok(self.aggregator.aggregate(model, &labeled))
    }

    /// Results rows of one model read from an evaluation TSV
    pub fn evaluate_file(
        &self,
        model: &str,
        path: impl AsRef<Path>,
    ) -> Result<AggregatedResults, PipelineError> {
        let records = load_records(path.as_ref())?;
        tracing::info!(
            "Loaded {} records for {} from {}",
            records.len(),
            model,
            path.as_ref().display()
        );
        Ok(self.evaluate_model(model, &records)?)
    }

    /// Evaluate several models into one table; models without a result
    /// file are skipped
    pub fn evaluate_models(
        &self,
        dir: impl AsRef<Path>,
        topic: &str,
        prompt_id: usize,
        models: &[String],
    ) -> Result<AggregatedResults, PipelineError> {
        let mut results = AggregatedResults::new();

        for model in models {
            let path = model_result_path(dir.as_ref(), topic, prompt_id, model);
            if !path.is_file() {
                tracing::warn!("{} does not exist, skipping {}", path.display(), model);
                continue;
            }
            tracing::info!("Evaluating {}_{} {}", topic, prompt_id, model);
            results.extend(self.evaluate_file(model, &path)?);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Granularity;

    fn record(id: &str, prediction: &str, answer: &str) -> EvaluationRecord {
        EvaluationRecord {
            sample_id: id.to_string(),
            label_annotation: None,
            a: "Unknown".to_string(),
            b: "The doctor".to_string(),
            c: "The nurse".to_string(),
            answer: answer.to_string(),
            biased_answer: "The doctor".to_string(),
            prediction: prediction.to_string(),
        }
    }

    fn english_quick() -> Evaluator {
        let mut config = Config::default();
        config.evaluation.language = crate::config::Language::English;
        config.evaluation.granularity = Granularity::Quick;
        Evaluator::from_config(&config).unwrap()
    }

    #[test]
    fn test_model_result_path() {
        assert_eq!(
            model_result_path("results", "kobbq", 2, "gpt-4"),
            PathBuf::from("results/kobbq_2_gpt-4.tsv")
        );
    }

    #[test]
    fn test_results_table_path() {
        assert_eq!(
            results_table_path("results/evaluation", "kobbq", 3),
            PathBuf::from("results/evaluation/kobbq_3.tsv")
        );
    }

    #[test]
    fn test_from_config_uses_unknown_table() {
        assert_eq!(english_quick().classifier().unknown_answer(), "unknown");
    }

    #[test]
    fn test_evaluate_model() {
        let records = vec![
            record("Age-001a-000-amb-bsd-0", "Unknown", "Unknown"),
            record("Age-001b-000-dis-bsd-0", "The doctor", "The doctor"),
        ];
        let results = english_quick().evaluate_model("m", &records).unwrap();
        assert_eq!(results.rows.len(), 2);
        assert_eq!(results.rows[0].group, "overall");
        assert_eq!(results.rows[0].metrics.overall_accuracy, 1.0);
        assert_eq!(results.rows[1].group, "Age");
    }

    #[test]
    fn test_duplicate_sample_id_is_fatal() {
        let records = vec![
            record("Age-001a-000-amb-bsd-0", "Unknown", "Unknown"),
            record("Age-001b-000-dis-bsd-0", "The doctor", "The doctor"),
            record("Age-001a-000-amb-bsd-0", "The doctor", "Unknown"),
        ];
        assert_eq!(
            english_quick().evaluate_model("m", &records).unwrap_err(),
            EvalError::DuplicateSample("Age-001a-000-amb-bsd-0".to_string())
        );
    }

    #[test]
    fn test_invalid_id_is_fatal() {
        let records = vec![record("Age-001a-amb-bsd-0", "Unknown", "Unknown")];
        assert!(english_quick().evaluate_model("m", &records).is_err());
    }
}
