//! Scan Summary / Report
//!
//! Summary = diagnostics của một run thành công.
//! Report = structured outcome cho orchestrator (status + message).

use std::path::PathBuf;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::error::ScanResult;
use crate::logic::features::ReconcileStats;
use crate::logic::model::NormalizeStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub input: String,
    pub records_read: usize,
    /// Records the extractor could not make sense of (no verdict)
    pub records_skipped: usize,
    pub records_scored: usize,
    pub anomaly_count: usize,
    pub classifier: String,
    pub threshold: f32,
    pub reconcile: ReconcileStats,
    pub normalize: NormalizeStats,
    /// Fewer real attributes than the classifier was trained on
    pub degraded: bool,
    pub output_path: PathBuf,
    pub inference_time_us: u64,
    pub elapsed_ms: u64,
}

impl ScanSummary {
    /// One structured log line per run
    pub fn log(&self) {
        log::info!(
            "scan_complete run_id={} input={} records_read={} records_skipped={} records_scored={} \
             anomalies={} classifier={} defaulted_fields={} dropped_fields={} coerced_missing={} \
             filled_missing={} degraded={} elapsed_ms={}",
            self.run_id,
            self.input,
            self.records_read,
            self.records_skipped,
            self.records_scored,
            self.anomaly_count,
            self.classifier,
            self.reconcile.defaulted_fields,
            self.reconcile.dropped_fields,
            self.reconcile.coerced_missing,
            self.normalize.filled_missing,
            self.degraded,
            self.elapsed_ms,
        );

        if self.degraded {
            log::warn!(
                "run_id={} scored with synthesized features: {:?}",
                self.run_id,
                self.reconcile.defaulted_summary()
            );
        }
    }
}

/// Outcome handed to whoever triggered the scan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScanReport {
    Success {
        anomalies: usize,
        summary: ScanSummary,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl ScanReport {
    pub fn from_result(result: &ScanResult<ScanSummary>) -> Self {
        match result {
            Ok(summary) => ScanReport::Success {
                anomalies: summary.anomaly_count,
                summary: summary.clone(),
            },
            Err(e) => ScanReport::Error {
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ScanReport::Success { .. })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "kind": "internal", "message": e.to_string() })
                .to_string()
        })
    }
}
