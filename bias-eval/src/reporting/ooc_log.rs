//! Audit log of answers that could not be mapped to a choice

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// One out-of-choice extraction event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OocRecord {
    pub id: String,
    /// Choice set as `{'A': .., 'B': .., 'C': ..}`
    pub choices: String,
    pub raw: String,
    pub processed: String,
}

/// Append-only destination for out-of-choice events
pub trait OocSink {
    fn record(&mut self, event: &OocRecord) -> std::io::Result<()>;
}

impl OocSink for Vec<OocRecord> {
    fn record(&mut self, event: &OocRecord) -> std::io::Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

/// Tab-separated audit log with an `id, choices, raw, processed` header
pub struct TsvOocLog {
    writer: csv::Writer<File>,
    written: usize,
}

impl TsvOocLog {
    /// Create (or truncate) the log and write its header
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(path.as_ref())?;
        writer.write_record(["id", "choices", "raw", "processed"])?;
        writer.flush()?;
        Ok(Self { writer, written: 0 })
    }

    /// Events recorded so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl OocSink for TsvOocLog {
    fn record(&mut self, event: &OocRecord) -> std::io::Result<()> {
        self.writer.write_record([
            event.id.as_str(),
            event.choices.as_str(),
            event.raw.as_str(),
            event.processed.as_str(),
        ])?;
        // keep the log readable if the run aborts later
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }
}
