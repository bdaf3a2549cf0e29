//! Model Module - Normalization & Classification
//!
//! Tách logic inference khỏi feature extraction.
//! Dễ dàng swap model: chỉ cần implement `Classifier`.

pub mod bundle;
pub mod inference;
pub mod normalizer;
pub mod threshold;

// Re-export common types
pub use bundle::{BundleManifest, ModelBundle, ModelSpec};
pub use inference::{Classifier, ClassifierAdapter, LinearClassifier, OnnxClassifier, ScoreBatch};
pub use normalizer::{NormalizeStats, Normalizer, ScalerParams};
pub use threshold::{ThresholdConfig, DEFAULT_THRESHOLD};
