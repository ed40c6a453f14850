//! Grouped results tables

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::classifier::LabeledSample;
use super::metrics::{MetricCalculator, MetricVector};
use crate::error::{EvalError, EvalResult};

/// Label of the row computed over every sample
pub const OVERALL_GROUP: &str = "overall";

/// How each group's statistics are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Directly over the group's rows
    Quick,
    /// Per template, then averaged across templates
    #[default]
    Full,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Quick => "quick",
            Granularity::Full => "full",
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(Granularity::Quick),
            "full" => Ok(Granularity::Full),
            _ => Err(format!("Unknown granularity: {}", s)),
        }
    }
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub model: String,
    pub group: String,
    pub metrics: MetricVector,
}

/// A group that produced no row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedGroup {
    pub model: String,
    pub group: String,
    pub reason: String,
}

/// Rows in output order plus the groups that had to be skipped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatedResults {
    pub rows: Vec<ResultRow>,
    pub skipped: Vec<SkippedGroup>,
}

impl AggregatedResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append another model's results after this one's
    pub fn extend(&mut self, other: AggregatedResults) {
        self.rows.extend(other.rows);
        self.skipped.extend(other.skipped);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Partitions labeled samples by group key and computes each group's row
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    calculator: MetricCalculator,
    granularity: Granularity,
    template_rows: bool,
}

impl Aggregator {
    pub fn new(calculator: MetricCalculator, granularity: Granularity) -> Self {
        Self {
            calculator,
            granularity,
            template_rows: false,
        }
    }

    /// Also emit one row per template after the category rows
    pub fn with_template_rows(mut self, enabled: bool) -> Self {
        self.template_rows = enabled;
        self
    }

    /// Statistics of one group at the configured granularity
    pub fn evaluate_group(&self, group: &str, samples: &[&LabeledSample]) -> EvalResult<MetricVector> {
        self.evaluate_at(self.granularity, group, samples)
    }

    fn evaluate_at(
        &self,
        granularity: Granularity,
        group: &str,
        samples: &[&LabeledSample],
    ) -> EvalResult<MetricVector> {
        match granularity {
            Granularity::Quick => self.calculator.compute(group, samples),
            Granularity::Full => self.evaluate_by_template(group, samples),
        }
    }

    fn evaluate_by_template(
        &self,
        group: &str,
        samples: &[&LabeledSample],
    ) -> EvalResult<MetricVector> {
        if samples.is_empty() {
            return Err(EvalError::EmptySlice {
                group: group.to_string(),
            });
        }

        let templates = partition(samples, |s| Some(s.sample_id.template_id()));

        let mut vectors = Vec::with_capacity(templates.len());
        let mut first_error = None;
        for (template, members) in &templates {
            match self.calculator.compute(template, members) {
                Ok(vector) => vectors.push(vector),
                Err(e) => {
                    tracing::warn!("Skipping template {} in group {}: {}", template, group, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match (vectors.is_empty(), first_error) {
            (true, Some(e)) => Err(e),
            _ => Ok(MetricVector::mean(&vectors)),
        }
    }

    /// Build the results table of one model.
    ///
    /// Row order: overall, each annotation label, each category, then (when
    /// enabled) each template; groups appear in first-encountered order.
    pub fn aggregate(&self, model: &str, samples: &[LabeledSample]) -> AggregatedResults {
        let all: Vec<&LabeledSample> = samples.iter().collect();
        let mut results = AggregatedResults::new();

        self.push_row(&mut results, model, OVERALL_GROUP, &all, self.granularity);

        let by_label = partition(&all, |s| s.label_annotation.clone());
        for (label, members) in &by_label {
            self.push_row(&mut results, model, label, members, self.granularity);
        }

        let by_category = partition(&all, |s| Some(s.category().to_string()));
        for (category, members) in &by_category {
            self.push_row(&mut results, model, category, members, self.granularity);
        }

        if self.template_rows {
            let by_template = partition(&all, |s| Some(s.sample_id.template_id()));
            for (template, members) in &by_template {
                self.push_row(&mut results, model, template, members, Granularity::Quick);
            }
        }

        tracing::info!(
            "Aggregated {} rows for model {} ({} skipped)",
            results.rows.len(),
            model,
            results.skipped.len()
        );
        results
    }

    fn push_row(
        &self,
        results: &mut AggregatedResults,
        model: &str,
        group: &str,
        samples: &[&LabeledSample],
        granularity: Granularity,
    ) {
        match self.evaluate_at(granularity, group, samples) {
            Ok(metrics) => results.rows.push(ResultRow {
                model: model.to_string(),
                group: group.to_string(),
                metrics,
            }),
            Err(e) => {
                tracing::warn!("Skipping group {} for model {}: {}", group, model, e);
                results.skipped.push(SkippedGroup {
                    model: model.to_string(),
                    group: group.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// Group samples by key in first-encountered order; `None` keys are dropped
fn partition<'a>(
    samples: &[&'a LabeledSample],
    key: impl Fn(&LabeledSample) -> Option<String>,
) -> IndexMap<String, Vec<&'a LabeledSample>> {
    let mut groups: IndexMap<String, Vec<&'a LabeledSample>> = IndexMap::new();
    for sample in samples.iter().copied() {
        if let Some(k) = key(sample) {
            groups.entry(k).or_default().push(sample);
        }
    }
    groups
}
