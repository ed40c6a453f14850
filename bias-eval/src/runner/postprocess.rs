//! Raw model output to resolved predictions

use std::path::Path;

use indexmap::IndexMap;

use super::PipelineError;
use crate::error::{EvalError, EvalResult};
use crate::extraction::{extract_detailed, Answer};
use crate::reporting::{OocRecord, OocSink};
use crate::samples::{load_raw_predictions, EvaluationRecord, RawPrediction, TsvTable};

/// Extracted answers keyed by sample id, in prediction order
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub answers: IndexMap<String, Answer>,
    pub ooc_count: usize,
}

impl ExtractionReport {
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn ooc_ratio(&self) -> f64 {
        if self.answers.is_empty() {
            f64::NAN
        } else {
            self.ooc_count as f64 / self.answers.len() as f64
        }
    }
}

/// Maps raw predictions onto the samples they answer
pub struct Postprocessor<'a> {
    samples: IndexMap<&'a str, &'a EvaluationRecord>,
}

impl<'a> Postprocessor<'a> {
    /// Index samples by id; an id may appear only once
    pub fn new(records: &'a [EvaluationRecord]) -> EvalResult<Self> {
        let mut samples = IndexMap::with_capacity(records.len());
        for record in records {
            if samples.insert(record.sample_id.as_str(), record).is_some() {
                return Err(EvalError::DuplicateSample(record.sample_id.clone()));
            }
        }
        Ok(Self { samples })
    }

    /// Extract every prediction, logging out-of-choice answers to `sink`
    pub fn extract_all(
        &self,
        predictions: &[RawPrediction],
        sink: &mut dyn OocSink,
    ) -> EvalResult<ExtractionReport> {
        let mut report = ExtractionReport::default();

        for prediction in predictions {
            let record = self
                .samples
                .get(prediction.guid.as_str())
                .ok_or_else(|| EvalError::SampleNotFound(prediction.guid.clone()))?;
            if report.answers.contains_key(&prediction.guid) {
                return Err(EvalError::DuplicateSample(prediction.guid.clone()));
            }

            let choices = record.choices();
            let extraction = extract_detailed(&prediction.raw, &choices);
            tracing::debug!(
                "{}: {:?} -> {}",
                prediction.guid,
                extraction.strategy,
                extraction.answer
            );

            if let Answer::OutOfChoice(processed) = &extraction.answer {
                report.ooc_count += 1;
                sink.record(&OocRecord {
                    id: prediction.guid.clone(),
                    choices: choices.to_string(),
                    raw: prediction.raw.clone(),
                    processed: processed.clone(),
                })
                .map_err(|e| EvalError::Sink(e.to_string()))?;
            }

            report
                .answers
                .insert(prediction.guid.clone(), extraction.answer);
        }

        tracing::info!(
            "Extracted {} predictions, {} out of choice",
            report.len(),
            report.ooc_count
        );
        Ok(report)
    }

    /// Prediction column for the samples, in sample order: letters become
    /// the choice text of that permutation, residual text is kept as is
    pub fn resolve(&self, answers: &IndexMap<String, Answer>) -> EvalResult<Vec<String>> {
        self.samples
            .iter()
            .map(|(id, record)| {
                let answer = answers
                    .get(*id)
                    .ok_or_else(|| EvalError::SampleNotFound(id.to_string()))?;
                Ok(answer.resolve(&record.choices()).to_string())
            })
            .collect()
    }
}

/// Run the whole extraction stage over files: read samples and raw
/// predictions, extract, and write the samples table with a `prediction`
/// column added (or replaced)
pub fn extract_file(
    predictions_path: impl AsRef<Path>,
    samples_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    sink: &mut dyn OocSink,
) -> Result<ExtractionReport, PipelineError> {
    let mut table = TsvTable::read(samples_path.as_ref())?;
    let records: Vec<EvaluationRecord> = table.deserialize()?;
    let predictions = load_raw_predictions(predictions_path.as_ref())?;
    tracing::info!(
        "Loaded {} samples and {} predictions",
        records.len(),
        predictions.len()
    );

    let postprocessor = Postprocessor::new(&records)?;
    let report = postprocessor.extract_all(&predictions, sink)?;
    let column = postprocessor.resolve(&report.answers)?;

    table.set_column("prediction", column)?;
    table.write(output_path.as_ref())?;
    tracing::info!("Wrote {}", output_path.as_ref().display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::ChoiceLabel;

    fn record(id: &str, a: &str, b: &str, c: &str) -> EvaluationRecord {
        EvaluationRecord {
            sample_id: id.to_string(),
            label_annotation: None,
            a: a.to_string(),
            b: b.to_string(),
            c: c.to_string(),
            answer: "알 수 없음".to_string(),
            biased_answer: "의사".to_string(),
            prediction: String::new(),
        }
    }

    fn records() -> Vec<EvaluationRecord> {
        vec![
            record("Age-001a-000-amb-bsd-0", "의사", "간호사", "알 수 없음"),
            record("Age-001a-000-amb-bsd-1", "알 수 없음", "의사", "간호사"),
        ]
    }

    #[test]
    fn test_extract_and_resolve() {
        let records = records();
        let post = Postprocessor::new(&records).unwrap();
        let predictions = vec![
            RawPrediction::new("Age-001a-000-amb-bsd-1", "A: 알 수 없음"),
            RawPrediction::new("Age-001a-000-amb-bsd-0", "잘 모르겠어요"),
        ];

        let mut sink: Vec<OocRecord> = Vec::new();
        let report = post.extract_all(&predictions, &mut sink).unwrap();
        assert_eq!(report.ooc_count, 1);
        assert_eq!(
            report.answers["Age-001a-000-amb-bsd-1"],
            Answer::Choice(ChoiceLabel::A)
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].id, "Age-001a-000-amb-bsd-0");
        assert_eq!(sink[0].processed, "잘 모르겠어요");

        let column = post.resolve(&report.answers).unwrap();
        assert_eq!(column, vec!["잘 모르겠어요", "알 수 없음"]);
    }

    #[test]
    fn test_unknown_and_duplicate_guids() {
        let records = records();
        let post = Postprocessor::new(&records).unwrap();
        let mut sink: Vec<OocRecord> = Vec::new();

        let unknown = vec![RawPrediction::new("Age-999a-000-amb-bsd-0", "A")];
        assert_eq!(
            post.extract_all(&unknown, &mut sink).unwrap_err(),
            EvalError::SampleNotFound("Age-999a-000-amb-bsd-0".to_string())
        );

        let dup = vec![
            RawPrediction::new("Age-001a-000-amb-bsd-0", "A"),
            RawPrediction::new("Age-001a-000-amb-bsd-0", "B"),
        ];
        assert!(matches!(
            post.extract_all(&dup, &mut sink),
            Err(EvalError::DuplicateSample(_))
        ));
    }

    #[test]
    fn test_missing_prediction_fails_resolution() {
        let records = records();
        let post = Postprocessor::new(&records).unwrap();
        let mut answers = IndexMap::new();
        answers.insert(
            "Age-001a-000-amb-bsd-0".to_string(),
            Answer::Choice(ChoiceLabel::B),
        );
        assert!(matches!(
            post.resolve(&answers),
            Err(EvalError::SampleNotFound(id)) if id == "Age-001a-000-amb-bsd-1"
        ));
    }

    #[test]
    fn test_duplicate_sample_ids_rejected() {
        let mut records = records();
        records.push(records[0].clone());
        assert!(Postprocessor::new(&records).is_err());
    }
}
