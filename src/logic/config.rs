//! Scan Configuration
//!
//! Thứ tự ưu tiên: defaults → JSON file → environment → CLI flags.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::error::{ScanError, ScanResult};
use crate::logic::model::ThresholdConfig;

/// How to read the scan input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Pick by file extension
    #[default]
    Auto,
    /// Bulk capture table (goes straight to the reconciler)
    Csv,
    /// Raw record stream (goes through the extractor)
    Jsonl,
}

impl InputFormat {
    pub fn resolve(self, path: &Path) -> InputFormat {
        match self {
            InputFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("jsonl") || ext.eq_ignore_ascii_case("ndjson") => {
                    InputFormat::Jsonl
                }
                _ => InputFormat::Csv,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Bundle manifest (model + frozen scaler)
    pub bundle_path: PathBuf,
    /// Result table
    pub output_path: PathBuf,
    /// Overrides the bundle / default threshold when set
    pub threshold: Option<f32>,
    pub input_format: InputFormat,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            bundle_path: constants::default_bundle_path(),
            output_path: constants::default_output_path(),
            threshold: None,
            input_format: InputFormat::Auto,
        }
    }
}

impl ScanConfig {
    /// Defaults, overlaid by an optional JSON file, then by the environment
    pub fn load(path: Option<&Path>) -> ScanResult<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ScanResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScanError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| ScanError::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Apply `NETSCAN_*` overrides from the given lookup
    pub fn apply_env<F>(&mut self, lookup: F) -> ScanResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bundle) = lookup(constants::ENV_BUNDLE).filter(|s| !s.trim().is_empty()) {
            self.bundle_path = PathBuf::from(bundle);
        }
        if let Some(output) = lookup(constants::ENV_OUTPUT).filter(|s| !s.trim().is_empty()) {
            self.output_path = PathBuf::from(output);
        }
        if let Some(raw) = lookup(constants::ENV_THRESHOLD) {
            let value = raw.trim().parse::<f32>().map_err(|_| {
                ScanError::Config(format!("{}={:?} is not a number", constants::ENV_THRESHOLD, raw))
            })?;
            self.threshold = Some(value);
        }
        Ok(())
    }

    /// Effective threshold: explicit override, else the bundle's, else default
    pub fn threshold_config(&self, bundle_threshold: Option<f32>) -> ScanResult<ThresholdConfig> {
        match self.threshold.or(bundle_threshold) {
            Some(t) => ThresholdConfig::new(t),
            None => Ok(ThresholdConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.output_path, PathBuf::from("predictions.csv"));
        assert!(config.bundle_path.ends_with("bundle.json"));
        assert_eq!(config.threshold_config(None).unwrap().base_threshold, 0.5);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{ "output_path": "out/result.csv", "input_format": "jsonl" }"#).unwrap();

        let config = ScanConfig::from_file(&path).unwrap();
        assert_eq!(config.output_path, PathBuf::from("out/result.csv"));
        assert_eq!(config.input_format, InputFormat::Jsonl);
        assert_eq!(config.threshold, None);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NETSCAN_OUTPUT", "/tmp/x.csv"),
            ("NETSCAN_THRESHOLD", "0.8"),
        ]
        .into_iter()
        .collect();

        let mut config = ScanConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.output_path, PathBuf::from("/tmp/x.csv"));
        assert_eq!(config.threshold, Some(0.8));
        // explicit override beats the bundle value
        assert_eq!(config.threshold_config(Some(0.3)).unwrap().base_threshold, 0.8);
    }

    #[test]
    fn test_bad_env_threshold() {
        let mut config = ScanConfig::default();
        let err = config
            .apply_env(|k| (k == "NETSCAN_THRESHOLD").then(|| "high".to_string()))
            .unwrap_err();
        assert_eq!(err.kind(), "config");
    }

    #[test]
    fn test_input_format_resolution() {
        assert_eq!(InputFormat::Auto.resolve(Path::new("a.jsonl")), InputFormat::Jsonl);
        assert_eq!(InputFormat::Auto.resolve(Path::new("live_packets.csv")), InputFormat::Csv);
        assert_eq!(InputFormat::Jsonl.resolve(Path::new("a.csv")), InputFormat::Jsonl);
    }

    #[test]
    fn test_input_format_cli_names() {
        use clap::ValueEnum;
        assert_eq!(InputFormat::from_str("jsonl", true).unwrap(), InputFormat::Jsonl);
        assert_eq!(InputFormat::from_str("CSV", true).unwrap(), InputFormat::Csv);
        assert!(InputFormat::from_str("xml", true).is_err());
    }
}
