//! Tab-separated sample and prediction files

use std::io::{Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;

use super::{EvaluationRecord, RawPrediction};

/// Error type for sample loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Tsv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' has {found} values for {expected} rows")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },
}

/// A whole TSV file kept as header plus raw rows.
///
/// Rewriting a table only touches the columns that were set, so extra
/// columns of the source file survive a read/write cycle.
#[derive(Debug, Clone)]
pub struct TsvTable {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.delimiter(b'\t').has_headers(true);
    builder
}

fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(b'\t');
    builder
}

impl TsvTable {
    /// Read a TSV file with a header row
    pub fn read(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut rdr = reader_builder().from_reader(reader);
        let headers = rdr.headers()?.clone();
        let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Deserialize every row by header name
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<Vec<T>, LoadError> {
        self.rows
            .iter()
            .map(|row| row.deserialize(Some(&self.headers)).map_err(LoadError::from))
            .collect()
    }

    /// Replace a column's values, appending the column if it is new
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), LoadError> {
        if values.len() != self.rows.len() {
            return Err(LoadError::ColumnLength {
                column: name.to_string(),
                expected: self.rows.len(),
                found: values.len(),
            });
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    let mut fields: Vec<String> = row.iter().map(String::from).collect();
                    fields[idx] = value;
                    *row = csv::StringRecord::from(fields);
                }
            }
            None => {
                self.headers.push_field(name);
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push_field(&value);
                }
            }
        }
        Ok(())
    }

    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path.as_ref())?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), LoadError> {
        let mut wtr = writer_builder().from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Load evaluation records (samples joined with predictions)
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<EvaluationRecord>, LoadError> {
    let table = TsvTable::read(path)?;
    for column in ["sample_id", "A", "B", "C", "answer", "biased_answer"] {
        if table.column_index(column).is_none() {
            return Err(LoadError::MissingColumn(column.to_string()));
        }
    }
    table.deserialize()
}

/// Load raw model outputs keyed by `guid`
pub fn load_raw_predictions(path: impl AsRef<Path>) -> Result<Vec<RawPrediction>, LoadError> {
    let table = TsvTable::read(path)?;
    if table.column_index("guid").is_none() {
        return Err(LoadError::MissingColumn("guid".to_string()));
    }
    table.deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &str = "sample_id\tlabel_annotation\tA\tB\tC\tanswer\tbiased_answer\n\
        Age-001a-000-amb-bsd-0\tok\t의사\t간호사\t알 수 없음\t알 수 없음\t의사\n\
        Age-001a-000-amb-bsd-1\tok\t알 수 없음\t의사\t간호사\t알 수 없음\t의사\n";

    #[test]
    fn test_deserialize_records() {
        let table = TsvTable::from_reader(SAMPLES.as_bytes()).unwrap();
        let records: Vec<EvaluationRecord> = table.deserialize().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label_annotation.as_deref(), Some("ok"));
        assert_eq!(records[1].a, "알 수 없음");
        assert!(records[0].prediction.is_empty());
    }

    #[test]
    fn test_set_column_appends_and_replaces() {
        let mut table = TsvTable::from_reader(SAMPLES.as_bytes()).unwrap();
        table
            .set_column("prediction", vec!["의사".to_string(), "x".to_string()])
            .unwrap();
        table
            .set_column("prediction", vec!["알 수 없음".to_string(), "y".to_string()])
            .unwrap();

        let mut out = Vec::new();
        table.to_writer(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.ends_with("\tprediction"));
        assert_eq!(header.matches("prediction").count(), 1);
        assert!(text.lines().nth(2).unwrap().ends_with("\ty"));
    }

    #[test]
    fn test_set_column_rejects_wrong_length() {
        let mut table = TsvTable::from_reader(SAMPLES.as_bytes()).unwrap();
        let err = table.set_column("prediction", vec![]).unwrap_err();
        assert!(matches!(err, LoadError::ColumnLength { expected: 2, found: 0, .. }));
    }
}
