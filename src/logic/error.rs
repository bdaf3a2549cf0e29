//! Scan Errors
//!
//! Chỉ những lỗi fatal mới đi qua đây. Missing fields và coercion failures
//! được xử lý tại chỗ (reconciler / normalizer) và không bao giờ trở thành error.

use std::path::Path;
use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Input table / record stream missing or unreadable
    #[error("source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Classifier bundle or model file missing / corrupt
    #[error("classifier artifact unavailable ({path}): {reason}")]
    ArtifactUnavailable { path: String, reason: String },

    /// Feature width / layout disagrees with the classifier artifact
    #[error("feature schema mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: String, got: String },

    /// Classifier failed while scoring
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Result table could not be written
    #[error("failed to write result table ({path}): {reason}")]
    Output { path: String, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScanError {
    pub fn source_unavailable(source: impl AsRef<Path>, reason: impl ToString) -> Self {
        ScanError::SourceUnavailable {
            source_name: source.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn artifact(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        ScanError::ArtifactUnavailable {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn width_mismatch(expected: usize, got: usize) -> Self {
        ScanError::SchemaMismatch {
            expected: format!("{} columns", expected),
            got: format!("{} columns", got),
        }
    }

    pub fn output(path: impl AsRef<Path>, reason: impl ToString) -> Self {
        ScanError::Output {
            path: path.as_ref().display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable tag used in structured failure reports
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::SourceUnavailable { .. } => "source_unavailable",
            ScanError::ArtifactUnavailable { .. } => "artifact_unavailable",
            ScanError::SchemaMismatch { .. } => "schema_mismatch",
            ScanError::Classifier(_) => "classifier",
            ScanError::Output { .. } => "output",
            ScanError::Config(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_mismatch_message() {
        let err = ScanError::width_mismatch(12, 9);
        assert_eq!(err.kind(), "schema_mismatch");
        assert_eq!(
            err.to_string(),
            "feature schema mismatch: expected 12 columns, got 9 columns"
        );
    }

    #[test]
    fn test_source_unavailable_keeps_cause() {
        let err = ScanError::source_unavailable("live_packets.csv", "No such file or directory");
        assert_eq!(err.kind(), "source_unavailable");
        assert!(err.to_string().contains("live_packets.csv"));
        assert!(err.to_string().contains("No such file"));
    }
}
