//! Verdict Module - thresholding + result table
//!
//! verdict = 1 nếu score > threshold, ngược lại 0. Giữ nguyên thứ tự input.

pub mod writer;


use serde::{Deserialize, Serialize};

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::model::ThresholdConfig;

pub use writer::{ResultWriter, RESULT_COLUMN};

/// Binary label for one surviving record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Position of the originating record in the input sequence
    pub position: usize,
    /// 1 = anomaly, 0 = benign
    pub label: u8,
}

impl Verdict {
    pub fn is_anomaly(&self) -> bool {
        self.label == 1
    }
}

/// Verdicts for one batch, in input order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictBatch {
    pub verdicts: Vec<Verdict>,
    pub anomaly_count: usize,
}

impl VerdictBatch {
    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.verdicts.iter().map(|v| v.label).collect()
    }
}

/// Threshold scores element-wise
///
/// `positions[i]` is the input position of the record behind `scores[i]`.
pub fn threshold(
    scores: &[f32],
    positions: &[usize],
    config: &ThresholdConfig,
) -> ScanResult<VerdictBatch> {
    if scores.len() != positions.len() {
        return Err(ScanError::Classifier(format!(
            "{} scores for {} records",
            scores.len(),
            positions.len()
        )));
    }

    let verdicts: Vec<Verdict> = scores
        .iter()
        .zip(positions)
        .map(|(&score, &position)| Verdict {
            position,
            label: config.label(score),
        })
        .collect();

    let anomaly_count = verdicts.iter().filter(|v| v.is_anomaly()).count();

    Ok(VerdictBatch { verdicts, anomaly_count })
}
