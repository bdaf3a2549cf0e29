//! Logic Module - Scan Pipeline Engines
//!
//! - `capture/` - Raw record sources (CSV table, JSON lines, memory)
//! - `features/` - Extraction + schema reconciliation
//! - `model/` - Normalization, classifier adapter, bundle loading
//! - `verdict/` - Thresholding + result table
//! - `pipeline/` - Orchestration of one scan run

pub mod capture;
pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod verdict;
