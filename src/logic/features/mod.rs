//! Features Module - Feature Extraction & Schema Reconciliation
//!
//! Tách logic trích xuất features từ raw records.
//! Extractor → Reconciler, với layout là single source of truth.

pub mod layout;
pub mod vector;
pub mod extractor;
pub mod reconcile;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, LayoutInfo};
pub use vector::FeatureVector;
pub use extractor::{FeatureExtractor, PacketAttributes, PacketExtractor};
pub use reconcile::{Cell, ReconcileStats, ReconciledRow, SchemaReconciler};
