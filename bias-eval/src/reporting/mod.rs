//! Results reporting

pub mod ooc_log;
pub mod tsv_writer;

pub use ooc_log::{OocRecord, OocSink, TsvOocLog};
pub use tsv_writer::{format_value, TsvWriter, HEADER};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::{AggregatedResults, Granularity, ResultRow, SkippedGroup};

/// JSON summary export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub timestamp: String,
    pub topic: String,
    pub prompt_id: usize,
    pub granularity: Granularity,
    pub models: Vec<String>,
    /// Undefined statistics serialize as `null`
    pub rows: Vec<ResultRow>,
    pub skipped: Vec<SkippedGroup>,
}

impl JsonSummary {
    /// Create from aggregated results
    pub fn from_results(
        topic: impl Into<String>,
        prompt_id: usize,
        granularity: Granularity,
        results: &AggregatedResults,
    ) -> Self {
        let mut models: Vec<String> = Vec::new();
        for row in &results.rows {
            if !models.contains(&row.model) {
                models.push(row.model.clone());
            }
        }

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            topic: topic.into(),
            prompt_id,
            granularity,
            models,
            rows: results.rows.clone(),
            skipped: results.skipped.clone(),
        }
    }

    /// Write to JSON file
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
    }
}

fn cell(value: f64) -> String {
    if value.is_nan() {
        format!("{:>8}", "NaN")
    } else {
        format!("{:>8.3}", value)
    }
}

/// Generate a console report
pub fn print_console_report(results: &AggregatedResults) {
    println!("\n=== Bias Evaluation Results ===\n");
    println!(
        "{:<16} {:<24} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Model", "Group", "OOC", "Incons", "Acc", "AccAmb", "AccDis", "DiffAmb", "DiffDis",
        "BBQAmb", "BBQDis"
    );
    println!("{:-<124}", "");

    for row in &results.rows {
        let cells: Vec<String> = row.metrics.to_array().into_iter().map(cell).collect();
        println!("{:<16} {:<24} {}", row.model, row.group, cells.join(" "));
    }

    if !results.skipped.is_empty() {
        println!("\nSkipped Groups:");
        println!("{:-<50}", "");
        for skipped in &results.skipped {
            println!("  {} / {}: {}", skipped.model, skipped.group, skipped.reason);
        }
    }

    println!("\n{:=<50}", "");
}
