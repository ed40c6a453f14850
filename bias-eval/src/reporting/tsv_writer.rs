//! Tab-separated results table

use std::io::Write;
use std::path::Path;

use crate::analysis::{AggregatedResults, ResultRow};

/// Fixed header of the results table
pub const HEADER: [&str; 11] = [
    "model",
    "category",
    "out-of-choice ratio",
    "inconsistency",
    "overall accuracy",
    "accuracy in ambiguous contexts",
    "accuracy in disambiguated contexts",
    "diff-bias in ambiguous contexts",
    "diff-bias in disambiguated contexts",
    "bbq bias score in ambiguous contexts",
    "bbq bias score in disambiguated contexts",
];

/// Render one statistic; undefined values become `NaN`
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else {
        value.to_string()
    }
}

fn row_fields(row: &ResultRow) -> Vec<String> {
    let mut fields = Vec::with_capacity(HEADER.len());
    fields.push(row.model.clone());
    fields.push(row.group.clone());
    fields.extend(row.metrics.to_array().into_iter().map(format_value));
    fields
}

/// Writes results tables
pub struct TsvWriter;

impl TsvWriter {
    /// Write the results table to a file, creating parent directories
    pub fn write_results(path: impl AsRef<Path>, results: &AggregatedResults) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path.as_ref())?;
        Self::to_writer(file, results)
    }

    pub fn to_writer<W: Write>(writer: W, results: &AggregatedResults) -> std::io::Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);
        wtr.write_record(HEADER)?;
        for row in &results.rows {
            wtr.write_record(row_fields(row))?;
        }
        wtr.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MetricVector;

    #[test]
    fn test_header_and_nan() {
        let mut metrics = MetricVector::undefined();
        metrics.ooc_ratio = 0.25;
        metrics.inconsistency = 1.5;
        let results = AggregatedResults {
            rows: vec![ResultRow {
                model: "gpt-4".to_string(),
                group: "overall".to_string(),
                metrics,
            }],
            skipped: vec![],
        };

        let mut out = Vec::new();
        TsvWriter::to_writer(&mut out, &results).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap(), HEADER.join("\t"));
        let row: Vec<&str> = lines.next().unwrap().split('\t').collect();
        assert_eq!(row.len(), 11);
        assert_eq!(&row[..4], &["gpt-4", "overall", "0.25", "1.5"]);
        assert!(row[4..].iter().all(|v| *v == "NaN"));
    }
}
