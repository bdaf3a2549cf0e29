use std::fs;
use std::path::{Path, PathBuf};

use crate::logic::error::{ScanError, ScanResult};
use super::VerdictBatch;

/// Single column of the result table
pub const RESULT_COLUMN: &str = "anomaly";

/// Writes the result table all-or-nothing
///
/// Rows go to a hidden sibling file first, which is renamed over the target
/// only after every row is flushed. A failed run never leaves a partial table.
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "predictions.csv".to_string());
        self.path.with_file_name(format!(".{}.partial", name))
    }

    pub fn write(&self, batch: &VerdictBatch) -> ScanResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ScanError::output(&self.path, e))?;
        }

        let staging = self.staging_path();
        if let Err(e) = self.write_rows(&staging, batch) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        fs::rename(&staging, &self.path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            ScanError::output(&self.path, e)
        })?;

        log::info!("Predictions saved to {} ({} rows)", self.path.display(), batch.len());
        Ok(())
    }

    fn write_rows(&self, staging: &Path, batch: &VerdictBatch) -> ScanResult<()> {
        let mut writer = csv::Writer::from_path(staging)
            .map_err(|e| ScanError::output(&self.path, e))?;

        writer
            .write_record([RESULT_COLUMN])
            .map_err(|e| ScanError::output(&self.path, e))?;

        for verdict in &batch.verdicts {
            writer
                .write_record([verdict.label.to_string()])
                .map_err(|e| ScanError::output(&self.path, e))?;
        }

        writer.flush().map_err(|e| ScanError::output(&self.path, e))?;
        Ok(())
    }
}

/// Read a result table back (labels in row order)
pub fn read_labels(path: &Path) -> ScanResult<Vec<u8>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| ScanError::source_unavailable(path, e))?;

    let mut labels = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| ScanError::source_unavailable(path, e))?;
        let label = row
            .get(0)
            .and_then(|cell| cell.trim().parse::<u8>().ok())
            .ok_or_else(|| ScanError::source_unavailable(path, format!("bad row: {:?}", row)))?;
        labels.push(label);
    }
    Ok(labels)
}
