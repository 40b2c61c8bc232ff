use std::io::Read;

use serde::Serialize;

use crate::constants::PREDICT_COLUMN;
use crate::error::PipelineError;
use crate::logic::features::{RawAccountRecord, RawSource};
use crate::logic::model::Label;

/// Rows sharing one header, cells kept as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BatchTable {
    /// Build from parts; every row must match the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, PipelineError> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(PipelineError::MalformedTable(format!(
                "row {} has {} cells, header has {}",
                i + 1,
                row.len(),
                headers.len()
            )));
        }
        Ok(Self { headers, rows })
    }

    /// Parse delimited text with a header line
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, PipelineError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| PipelineError::MalformedTable(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(PipelineError::MalformedTable("table has no header".to_string()));
        }

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| PipelineError::MalformedTable(e.to_string()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        log::debug!("Parsed table: {} columns, {} rows", headers.len(), rows.len());
        Self::new(headers, rows)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, PipelineError> {
        Self::from_csv_reader(text.as_bytes())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// Each row as a raw source for the assembler
    pub fn sources(&self) -> impl Iterator<Item = RawSource<'_>> {
        self.rows.iter().map(|row| RawSource::TableRow {
            headers: &self.headers,
            row,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = RawAccountRecord> + '_ {
        self.sources().map(|source| RawAccountRecord::from_source(&source))
    }

    /// Copy of the table with one label per row appended as `predict`.
    ///
    /// An existing `predict` column is overwritten in place rather than
    /// duplicated.
    pub fn with_predictions(&self, labels: &[Label]) -> Result<Self, PipelineError> {
        if labels.len() != self.rows.len() {
            return Err(PipelineError::MalformedTable(format!(
                "{} predictions for {} rows",
                labels.len(),
                self.rows.len()
            )));
        }

        let existing = self.headers.iter().position(|h| h == PREDICT_COLUMN);
        let mut headers = self.headers.clone();
        if existing.is_none() {
            headers.push(PREDICT_COLUMN.to_string());
        }

        let rows = self
            .rows
            .iter()
            .zip(labels)
            .map(|(row, label)| {
                let mut row = row.clone();
                let cell = label.value().to_string();
                match existing {
                    Some(i) => row[i] = cell,
                    None => row.push(cell),
                }
                row
            })
            .collect();

        Ok(Self { headers, rows })
    }

    /// Serialize back to CSV
    pub fn to_csv_string(&self) -> Result<String, PipelineError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.headers)
            .map_err(|e| PipelineError::MalformedTable(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| PipelineError::MalformedTable(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| PipelineError::MalformedTable(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| PipelineError::MalformedTable(e.to_string()))
    }
}
