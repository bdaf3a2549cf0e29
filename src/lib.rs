//! Network anomaly scan core
//!
//! Turns captured packet records into the fixed feature layout a pre-trained
//! classifier expects and writes one anomaly verdict per record.

pub mod constants;
pub mod logic;

pub use logic::config::{InputFormat, ScanConfig};
pub use logic::error::{ScanError, ScanResult};
pub use logic::pipeline::{run_scan, Pipeline, ScanInput, ScanReport, ScanSummary};
