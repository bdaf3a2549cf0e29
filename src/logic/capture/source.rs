//! Record Sources
//!
//! Adapters cho dữ liệu từ capture tool bên ngoài: bảng CSV, JSON lines,
//! hoặc records đã có sẵn trong memory.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::logic::error::{ScanError, ScanResult};
use super::record::{RawRecord, RawValue};

/// Anything that can deliver a finite sequence of raw records
pub trait RecordSource {
    /// Human-readable name for logs and error messages
    fn name(&self) -> String;

    /// Read every record, in source order
    fn read_records(&mut self) -> ScanResult<Vec<RawRecord>>;
}

// ============================================================================
// CSV TABLE
// ============================================================================

/// Tabular capture file: rows = records, header = raw attribute names
pub struct TableSource {
    path: PathBuf,
}

impl TableSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for TableSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_records(&mut self) -> ScanResult<Vec<RawRecord>> {
        let file = File::open(&self.path)
            .map_err(|e| ScanError::source_unavailable(&self.path, e))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(file);

        let headers = reader
            .headers()
            .map_err(|e| ScanError::source_unavailable(&self.path, e))?
            .clone();

        log::debug!("Capture table {} columns: {:?}", self.path.display(), headers);

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let row_data = result.map_err(|e| {
                ScanError::source_unavailable(&self.path, format!("row {}: {}", row + 1, e))
            })?;

            // Ragged rows: cells past the header are ignored, short rows just lack keys
            let record = RawRecord::from_pairs(
                headers
                    .iter()
                    .zip(row_data.iter())
                    .map(|(name, cell)| (name.to_string(), RawValue::from_cell(cell))),
            );
            records.push(record);
        }

        log::info!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

// ============================================================================
// JSON LINES
// ============================================================================

/// Live record stream dumped as one JSON object per line
pub struct JsonLinesSource {
    path: PathBuf,
}

impl JsonLinesSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonLinesSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn read_records(&mut self) -> ScanResult<Vec<RawRecord>> {
        let file = File::open(&self.path)
            .map_err(|e| ScanError::source_unavailable(&self.path, e))?;

        let mut records = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| ScanError::source_unavailable(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }

            let value: serde_json::Value = serde_json::from_str(&line).map_err(|e| {
                ScanError::source_unavailable(&self.path, format!("line {}: {}", idx + 1, e))
            })?;

            let object = value.as_object().ok_or_else(|| {
                ScanError::source_unavailable(
                    &self.path,
                    format!("line {}: expected a JSON object", idx + 1),
                )
            })?;

            records.push(RawRecord::from_json_object(object));
        }

        log::info!("Read {} records from {}", records.len(), self.path.display());
        Ok(records)
    }
}

// ============================================================================
// IN-MEMORY
// ============================================================================

/// Records already delivered by a capture library in-process
#[derive(Debug, Default)]
pub struct VecSource {
    records: Vec<RawRecord>,
}

impl VecSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for VecSource {
    fn name(&self) -> String {
        "<memory>".to_string()
    }

    fn read_records(&mut self) -> ScanResult<Vec<RawRecord>> {
        Ok(std::mem::take(&mut self.records))
    }
}
