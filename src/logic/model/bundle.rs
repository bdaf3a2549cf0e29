//! Model Bundle - classifier artifact + frozen training statistics
//!
//! Một manifest JSON gói: layout đã train, scaler params, threshold và model.
//!
//! ```json
//! {
//!   "feature_version": 1,
//!   "layout_hash": 1234567890,
//!   "feature_names": ["protocol", "src_port", ...],
//!   "scaler": { "mean": [...], "scale": [...] },
//!   "threshold": 0.5,
//!   "model": { "kind": "onnx", "path": "network_anomaly_model.onnx", "sha256": "..." }
//! }
//! ```

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::features::layout::{
    normalize_field_name, validate_layout, FEATURE_COUNT, FEATURE_LAYOUT,
};
use super::inference::{Classifier, LinearClassifier, OnnxClassifier};
use super::normalizer::ScalerParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModelSpec {
    Onnx {
        /// Relative paths resolve against the manifest directory
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sha256: Option<String>,
    },
    Linear {
        weights: Vec<f32>,
        bias: f32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub feature_version: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<u32>,
    pub feature_names: Vec<String>,
    pub scaler: ScalerParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    pub model: ModelSpec,
}

#[derive(Debug, Clone)]
pub struct ModelBundle {
    manifest: BundleManifest,
    manifest_path: PathBuf,
}

impl ModelBundle {
    /// Load and validate a bundle manifest
    ///
    /// Fails with `ArtifactUnavailable` when the manifest is missing or
    /// corrupt and with `SchemaMismatch` when it was trained on another layout.
    pub fn load(manifest_path: &Path) -> ScanResult<Self> {
        log::info!("Loading model bundle from: {}", manifest_path.display());

        let content = std::fs::read_to_string(manifest_path)
            .map_err(|e| ScanError::artifact(manifest_path, format!("Failed to read manifest: {}", e)))?;

        let manifest: BundleManifest = serde_json::from_str(&content)
            .map_err(|e| ScanError::artifact(manifest_path, format!("Failed to parse manifest: {}", e)))?;

        Self::from_manifest(manifest, manifest_path.to_path_buf())
    }

    pub fn from_manifest(manifest: BundleManifest, manifest_path: PathBuf) -> ScanResult<Self> {
        let bundle = Self { manifest, manifest_path };
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> ScanResult<()> {
        let m = &self.manifest;

        let names: Vec<String> = m.feature_names.iter().map(|n| normalize_field_name(n)).collect();
        if names.len() != FEATURE_COUNT || names.iter().zip(FEATURE_LAYOUT).any(|(a, b)| a != b) {
            return Err(ScanError::SchemaMismatch {
                expected: format!("{:?}", FEATURE_LAYOUT),
                got: format!("{:?}", names),
            });
        }

        if let Some(hash) = m.layout_hash {
            validate_layout(m.feature_version, hash).map_err(|e| ScanError::SchemaMismatch {
                expected: format!("v{} ({:08x})", e.expected_version, e.expected_hash),
                got: format!("v{} ({:08x})", e.actual_version, e.actual_hash),
            })?;
        } else if m.feature_version != crate::logic::features::FEATURE_VERSION {
            return Err(ScanError::SchemaMismatch {
                expected: format!("feature version {}", crate::logic::features::FEATURE_VERSION),
                got: format!("feature version {}", m.feature_version),
            });
        }

        m.scaler.validate().map_err(|e| match e {
            ScanError::Config(reason) => ScanError::artifact(&self.manifest_path, reason),
            other => other,
        })?;

        if let Some(t) = m.threshold {
            if !t.is_finite() {
                return Err(ScanError::artifact(&self.manifest_path, "threshold is not finite"));
            }
        }

        if let ModelSpec::Linear { weights, bias } = &m.model {
            if weights.len() != FEATURE_COUNT {
                return Err(ScanError::width_mismatch(FEATURE_COUNT, weights.len()));
            }
            if weights.iter().any(|w| !w.is_finite()) || !bias.is_finite() {
                return Err(ScanError::artifact(&self.manifest_path, "linear model has non-finite weights"));
            }
        }

        Ok(())
    }

    pub fn scaler(&self) -> &ScalerParams {
        &self.manifest.scaler
    }

    pub fn threshold(&self) -> Option<f32> {
        self.manifest.threshold
    }

    /// Resolve a model path against the manifest directory
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.manifest_path
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }

    /// Instantiate the classifier described by the bundle
    pub fn build_classifier(&self) -> ScanResult<Box<dyn Classifier>> {
        match &self.manifest.model {
            ModelSpec::Linear { weights, bias } => {
                log::info!("Using linear classifier from bundle");
                Ok(Box::new(LinearClassifier::new(weights.clone(), *bias)))
            }
            ModelSpec::Onnx { path, sha256 } => {
                let model_path = self.resolve(path);

                let Some(expected) = sha256 else {
                    return Ok(Box::new(OnnxClassifier::load(&model_path, FEATURE_COUNT)?));
                };

                let bytes = std::fs::read(&model_path)
                    .map_err(|e| ScanError::artifact(&model_path, format!("Failed to read model: {}", e)))?;
                verify_checksum(&model_path, &bytes, expected)?;

                Ok(Box::new(OnnxClassifier::load_from_bytes(&bytes, FEATURE_COUNT)?))
            }
        }
    }
}

/// Compare the SHA-256 of the model bytes against the manifest
pub fn verify_checksum(path: &Path, bytes: &[u8], expected: &str) -> ScanResult<()> {
    let actual = hex::encode(Sha256::digest(bytes));
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(ScanError::artifact(
            path,
            format!("checksum mismatch: expected {}, got {}", expected, actual),
        ));
    }
    log::debug!("Model checksum verified: {}", actual);
    Ok(())
}
