//! Inference Engine - Classifier Adapter
//!
//! Scoring boundary duy nhất: `score(batch) -> scores`.
//! Không làm feature engineering ở đây; đổi model không ảnh hưởng upstream.

use std::path::Path;
use ndarray::{Array2, ArrayView2};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::features::FEATURE_COUNT;

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait cho pre-trained binary classifiers (ONNX, linear, ...)
pub trait Classifier {
    /// Short identifier for logs ("onnx", "linear")
    fn name(&self) -> &str;

    /// Number of input columns the artifact was trained with
    fn input_width(&self) -> usize;

    /// One score per row, same order as the rows
    fn score(&self, batch: ArrayView2<'_, f32>) -> ScanResult<Vec<f32>>;
}

/// Scores for one batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBatch {
    pub scores: Vec<f32>,
    pub inference_time_us: u64,
    pub method: String,
}

// ============================================================================
// ADAPTER
// ============================================================================

/// Wraps a classifier and enforces the shape contract
pub struct ClassifierAdapter {
    classifier: Box<dyn Classifier>,
}

impl ClassifierAdapter {
    pub fn new(classifier: Box<dyn Classifier>) -> ScanResult<Self> {
        if classifier.input_width() != FEATURE_COUNT {
            return Err(ScanError::width_mismatch(FEATURE_COUNT, classifier.input_width()));
        }
        Ok(Self { classifier })
    }

    pub fn name(&self) -> &str {
        self.classifier.name()
    }

    /// Score a normalized batch
    ///
    /// A column count other than the trained width is a configuration defect
    /// and fails before the model is invoked.
    pub fn score(&self, batch: ArrayView2<'_, f32>) -> ScanResult<ScoreBatch> {
        let expected = self.classifier.input_width();
        if batch.ncols() != expected {
            return Err(ScanError::width_mismatch(expected, batch.ncols()));
        }

        if batch.nrows() == 0 {
            return Ok(ScoreBatch {
                scores: Vec::new(),
                inference_time_us: 0,
                method: self.name().to_string(),
            });
        }

        let start_time = std::time::Instant::now();
        let scores = self.classifier.score(batch)?;

        if scores.len() != batch.nrows() {
            return Err(ScanError::Classifier(format!(
                "{} returned {} scores for {} rows",
                self.name(),
                scores.len(),
                batch.nrows()
            )));
        }

        let inference_time_us = start_time.elapsed().as_micros() as u64;
        log::debug!(
            "Scored {} rows with {} in {}us",
            batch.nrows(),
            self.name(),
            inference_time_us
        );

        Ok(ScoreBatch {
            scores,
            inference_time_us,
            method: self.name().to_string(),
        })
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxClassifier {
    session: Mutex<Session>,
    output_name: String,
    input_width: usize,
}

impl OnnxClassifier {
    /// Load ONNX model từ file
    pub fn load(model_path: &Path, input_width: usize) -> ScanResult<Self> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(ScanError::artifact(model_path, "model not found"));
        }

        let session = Session::builder()
            .map_err(|e| ScanError::artifact(model_path, format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ScanError::artifact(model_path, format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| ScanError::artifact(model_path, format!("Failed to load model: {}", e)))?;

        Self::from_session(session, input_width)
            .map_err(|e| ScanError::artifact(model_path, e))
    }

    /// Load ONNX model từ bytes
    pub fn load_from_bytes(model_bytes: &[u8], input_width: usize) -> ScanResult<Self> {
        log::info!("Loading ONNX model from memory ({} bytes)", model_bytes.len());

        let session = Session::builder()
            .map_err(|e| ScanError::artifact("<memory>", format!("Session builder error: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| ScanError::artifact("<memory>", format!("Optimization error: {}", e)))?
            .commit_from_memory(model_bytes)
            .map_err(|e| ScanError::artifact("<memory>", format!("Load from memory error: {}", e)))?;

        Self::from_session(session, input_width)
            .map_err(|e| ScanError::artifact("<memory>", e))
    }

    fn from_session(session: Session, input_width: usize) -> Result<Self, String> {
        let output_name = session.outputs.first()
            .map(|o| o.name.clone())
            .ok_or_else(|| "No output defined".to_string())?;

        log::info!("ONNX model loaded successfully (output: {})", output_name);

        Ok(Self {
            session: Mutex::new(session),
            output_name,
            input_width,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn input_width(&self) -> usize {
        self.input_width
    }

    fn score(&self, batch: ArrayView2<'_, f32>) -> ScanResult<Vec<f32>> {
        let rows = batch.nrows();
        let input_array: Array2<f32> = batch.to_owned();

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| ScanError::Classifier(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![input_tensor])
            .map_err(|e| ScanError::Classifier(format!("Inference failed: {}", e)))?;

        let output = outputs.get(&self.output_name)
            .ok_or_else(|| ScanError::Classifier("No output".to_string()))?;

        let output_tensor = output.try_extract_tensor::<f32>()
            .map_err(|e| ScanError::Classifier(format!("Extract error: {}", e)))?;

        let data = output_tensor.1;

        // [N] / [N,1] sigmoid output, or [N,2] softmax with the anomaly class second
        match data.len() {
            n if n == rows => Ok(data.to_vec()),
            n if n == rows * 2 => Ok(data.chunks_exact(2).map(|pair| pair[1]).collect()),
            n => Err(ScanError::Classifier(format!(
                "unexpected output size {} for {} rows",
                n, rows
            ))),
        }
    }
}

// ============================================================================
// LINEAR IMPLEMENTATION
// ============================================================================

/// Logistic model: `sigmoid(w . x + b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearClassifier {
    pub weights: Vec<f32>,
    pub bias: f32,
}

impl LinearClassifier {
    pub fn new(weights: Vec<f32>, bias: f32) -> Self {
        Self { weights, bias }
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl Classifier for LinearClassifier {
    fn name(&self) -> &str {
        "linear"
    }

    fn input_width(&self) -> usize {
        self.weights.len()
    }

    fn score(&self, batch: ArrayView2<'_, f32>) -> ScanResult<Vec<f32>> {
        Ok(batch
            .rows()
            .into_iter()
            .map(|row| {
                let z: f32 = row.iter().zip(&self.weights).map(|(x, w)| x * w).sum();
                sigmoid(z + self.bias)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns fixed scores regardless of input
    struct FixedClassifier {
        width: usize,
        scores: Vec<f32>,
    }

    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            "fixed"
        }
        fn input_width(&self) -> usize {
            self.width
        }
        fn score(&self, _batch: ArrayView2<'_, f32>) -> ScanResult<Vec<f32>> {
            Ok(self.scores.clone())
        }
    }

    #[test]
    fn test_linear_scores_in_order() {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[3] = 1.0;
        let adapter = ClassifierAdapter::new(Box::new(LinearClassifier::new(weights, 0.0))).unwrap();

        let mut batch = Array2::<f32>::zeros((3, FEATURE_COUNT));
        batch[[0, 3]] = -5.0;
        batch[[2, 3]] = 5.0;

        let result = adapter.score(batch.view()).unwrap();
        assert_eq!(result.scores.len(), 3);
        assert!(result.scores[0] < 0.5);
        assert_eq!(result.scores[1], 0.5);
        assert!(result.scores[2] > 0.5);
        assert_eq!(result.method, "linear");
    }

    #[test]
    fn test_width_mismatch_is_fatal() {
        let adapter = ClassifierAdapter::new(Box::new(LinearClassifier::new(
            vec![0.0; FEATURE_COUNT],
            0.0,
        )))
        .unwrap();

        let batch = Array2::<f32>::zeros((2, FEATURE_COUNT - 1));
        let err = adapter.score(batch.view()).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }

    #[test]
    fn test_classifier_trained_on_other_width_rejected() {
        let result = ClassifierAdapter::new(Box::new(LinearClassifier::new(vec![0.0; 9], 0.0)));
        assert!(matches!(result, Err(ScanError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_empty_batch_skips_model() {
        let adapter = ClassifierAdapter::new(Box::new(FixedClassifier {
            width: FEATURE_COUNT,
            scores: vec![0.9],
        }))
        .unwrap();

        let batch = Array2::<f32>::zeros((0, FEATURE_COUNT));
        assert!(adapter.score(batch.view()).unwrap().scores.is_empty());
    }

    #[test]
    fn test_wrong_score_count_is_fatal() {
        let adapter = ClassifierAdapter::new(Box::new(FixedClassifier {
            width: FEATURE_COUNT,
            scores: vec![0.9],
        }))
        .unwrap();

        let batch = Array2::<f32>::zeros((2, FEATURE_COUNT));
        let err = adapter.score(batch.view()).unwrap_err();
        assert_eq!(err.kind(), "classifier");
    }
}
