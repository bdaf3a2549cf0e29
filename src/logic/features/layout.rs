//! Feature Layout - Centralized Feature Schema
//!
//! **CRITICAL: This file controls the feature schema the classifier expects**
//!
//! ## Rules (NEVER break these):
//! 1. Add feature → increment FEATURE_VERSION
//! 2. Change order → increment FEATURE_VERSION
//! 3. Remove feature → increment FEATURE_VERSION
//!
//! Model bundles declare the version + hash they were trained against and are
//! rejected at load time when they disagree with this file.

use crc32fast::Hasher;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Total number of features
pub const FEATURE_COUNT: usize = 12;

/// Canonical (trimmed, lowercase) feature names in vector order
/// This is the SINGLE SOURCE OF TRUTH for feature layout
pub const FEATURE_LAYOUT: [&str; FEATURE_COUNT] = [
    // === Live packet attributes (0-3) ===
    "protocol",                     // 0: Transport protocol (categorical)
    "src_port",                     // 1: Source port
    "dst_port",                     // 2: Destination port
    "length",                       // 3: Packet length in bytes

    // === Flow statistics (4-11) ===
    "flow duration",                // 4
    "total fwd packet",             // 5
    "total bwd packets",            // 6
    "total length of fwd packet",   // 7
    "total length of bwd packet",   // 8
    "fwd packet length max",        // 9
    "bwd packet length max",        // 10
    "packet length mean",           // 11
];

/// Index of the only categorical feature
pub const PROTOCOL_INDEX: usize = 0;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

static LAYOUT_HASH: Lazy<u32> = Lazy::new(compute_layout_hash);

/// Cached layout hash
pub fn layout_hash() -> u32 {
    *LAYOUT_HASH
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Canonical form of a field name: trimmed and case-folded
pub fn normalize_field_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Get feature index by name (any casing / surrounding whitespace)
pub fn feature_index(name: &str) -> Option<usize> {
    let wanted = normalize_field_name(name);
    FEATURE_LAYOUT.iter().position(|&n| n == wanted)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

/// Whether the slot holds a categorical token rather than a measurement
pub fn is_categorical(index: usize) -> bool {
    index == PROTOCOL_INDEX
}

// ============================================================================
// TESTS
// ============================================================================
