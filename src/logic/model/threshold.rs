//! Threshold Configuration
//!
//! Quản lý ngưỡng phát hiện anomaly. So sánh strict: `score > threshold`.

use serde::{Deserialize, Serialize};

use crate::logic::error::{ScanError, ScanResult};

/// Default decision threshold for probabilistic classifiers
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Scores strictly above this are anomalies
    pub base_threshold: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            base_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    pub fn new(base: f32) -> ScanResult<Self> {
        if !base.is_finite() {
            return Err(ScanError::Config(format!("threshold must be finite, got {}", base)));
        }
        Ok(Self { base_threshold: base })
    }

    /// Check if score exceeds threshold
    pub fn is_anomaly(&self, score: f32) -> bool {
        score > self.base_threshold
    }

    /// Binary label for a score
    pub fn label(&self, score: f32) -> u8 {
        u8::from(self.is_anomaly(score))
    }
}
