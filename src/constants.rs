//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.

use std::path::PathBuf;

/// Default result table name (consumers poll for this file)
pub const DEFAULT_OUTPUT_FILE: &str = "predictions.csv";

/// Default bundle manifest name inside the data directory
pub const DEFAULT_BUNDLE_FILE: &str = "bundle.json";

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "netscan";

/// Environment overrides
pub const ENV_BUNDLE: &str = "NETSCAN_BUNDLE";
pub const ENV_OUTPUT: &str = "NETSCAN_OUTPUT";
pub const ENV_THRESHOLD: &str = "NETSCAN_THRESHOLD";

/// Platform data directory for model bundles
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default bundle manifest location
pub fn default_bundle_path() -> PathBuf {
    get_data_dir().join(DEFAULT_BUNDLE_FILE)
}

/// Default result table location (working directory)
pub fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_FILE)
}
