//! Normalizer - categorical encoding + frozen standardization
//!
//! Dùng statistics từ lúc training (load từ bundle), KHÔNG fit lại trên
//! live batch.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::logic::error::{ScanError, ScanResult};
use crate::logic::features::{Cell, FeatureVector, ReconciledRow, FEATURE_COUNT};

/// Neutral value for anything unknown or missing
pub const FILL_VALUE: f32 = 0.0;

/// IANA protocol numbers for transport names seen in captures
const PROTOCOL_CODES: &[(&str, f32)] = &[
    ("icmp", 1.0),
    ("igmp", 2.0),
    ("tcp", 6.0),
    ("udp", 17.0),
    ("gre", 47.0),
    ("esp", 50.0),
    ("ah", 51.0),
    ("icmpv6", 58.0),
    ("sctp", 132.0),
    ("udplite", 136.0),
];

/// Map a protocol token to its numeric code; unknown tokens map to 0
pub fn encode_protocol(token: &str) -> f32 {
    let token = token.trim().to_ascii_lowercase();
    PROTOCOL_CODES
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, code)| *code)
        .unwrap_or(FILL_VALUE)
}

// ============================================================================
// SCALER PARAMS
// ============================================================================

/// Standardization parameters captured at training time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f32>,
    pub scale: Vec<f32>,
}

impl ScalerParams {
    /// No-op scaling (mean 0, scale 1)
    pub fn identity() -> Self {
        Self {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    pub fn validate(&self) -> ScanResult<()> {
        if self.mean.len() != FEATURE_COUNT || self.scale.len() != FEATURE_COUNT {
            return Err(ScanError::SchemaMismatch {
                expected: format!("{} scaler columns", FEATURE_COUNT),
                got: format!("mean={} scale={}", self.mean.len(), self.scale.len()),
            });
        }
        if self.mean.iter().any(|v| !v.is_finite()) {
            return Err(ScanError::Config("scaler mean contains non-finite values".to_string()));
        }
        Ok(())
    }

    /// Effective divisor for a column; zero / non-finite scale means constant column
    fn divisor(&self, column: usize) -> f32 {
        let s = self.scale[column];
        if s.is_finite() && s.abs() > f32::EPSILON { s } else { 1.0 }
    }
}

impl Default for ScalerParams {
    fn default() -> Self {
        Self::identity()
    }
}

// ============================================================================
// NORMALIZER
// ============================================================================

/// Counters for values filled during normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizeStats {
    pub filled_missing: usize,
    pub unknown_categories: usize,
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    params: ScalerParams,
}

impl Normalizer {
    pub fn new(params: ScalerParams) -> ScanResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &ScalerParams {
        &self.params
    }

    /// Encode + fill one row (no scaling)
    pub fn encode_row(&self, row: &ReconciledRow, stats: &mut NormalizeStats) -> FeatureVector {
        let values: [f32; FEATURE_COUNT] = std::array::from_fn(|i| match &row.cells[i] {
            Cell::Numeric(v) => {
                let v = *v as f32;
                if v.is_finite() {
                    v
                } else {
                    stats.filled_missing += 1;
                    FILL_VALUE
                }
            }
            Cell::Categorical(token) => {
                let code = encode_protocol(token);
                if code == FILL_VALUE {
                    stats.unknown_categories += 1;
                }
                code
            }
            Cell::Missing => {
                stats.filled_missing += 1;
                FILL_VALUE
            }
        });

        FeatureVector::from_values(values)
    }

    /// Standardize an encoded vector with the frozen statistics
    pub fn scale(&self, vector: &FeatureVector) -> FeatureVector {
        let values: [f32; FEATURE_COUNT] = std::array::from_fn(|i| {
            let z = (vector.values[i] - self.params.mean[i]) / self.params.divisor(i);
            if z.is_finite() { z } else { FILL_VALUE }
        });
        FeatureVector::from_values(values)
    }

    /// Normalize a whole batch into an `[N x FEATURE_COUNT]` matrix
    ///
    /// Returns the encoded (unscaled) vectors alongside the scaled matrix so
    /// callers can inspect what the classifier was actually fed.
    pub fn normalize_batch(
        &self,
        rows: &[ReconciledRow],
    ) -> ScanResult<(Vec<FeatureVector>, Array2<f32>, NormalizeStats)> {
        let mut stats = NormalizeStats::default();
        let mut encoded = Vec::with_capacity(rows.len());
        let mut data = Vec::with_capacity(rows.len() * FEATURE_COUNT);

        for row in rows {
            let vector = self.encode_row(row, &mut stats);
            data.extend_from_slice(self.scale(&vector).as_slice());
            encoded.push(vector);
        }

        let matrix = Array2::from_shape_vec((rows.len(), FEATURE_COUNT), data)
            .map_err(|e| ScanError::SchemaMismatch {
                expected: format!("{} x {}", rows.len(), FEATURE_COUNT),
                got: e.to_string(),
            })?;

        Ok((encoded, matrix, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: [Cell; FEATURE_COUNT]) -> ReconciledRow {
        ReconciledRow { position: 0, cells }
    }

    fn zeros() -> [Cell; FEATURE_COUNT] {
        std::array::from_fn(|_| Cell::Numeric(0.0))
    }

    #[test]
    fn test_encode_protocol() {
        assert_eq!(encode_protocol("TCP"), 6.0);
        assert_eq!(encode_protocol(" udp "), 17.0);
        assert_eq!(encode_protocol("QUIC"), 0.0);
        assert_eq!(encode_protocol("??"), 0.0);
    }

    #[test]
    fn test_missing_and_unknown_fill_zero() {
        let normalizer = Normalizer::new(ScalerParams::identity()).unwrap();
        let mut cells = zeros();
        cells[0] = Cell::Categorical("FOO".to_string());
        cells[3] = Cell::Missing;
        cells[4] = Cell::Numeric(f64::NAN);

        let mut stats = NormalizeStats::default();
        let vector = normalizer.encode_row(&row(cells), &mut stats);

        assert_eq!(vector.values[0], 0.0);
        assert_eq!(vector.values[3], 0.0);
        assert_eq!(vector.values[4], 0.0);
        assert_eq!(stats.filled_missing, 2);
        assert_eq!(stats.unknown_categories, 1);
        assert!(vector.is_finite());
    }

    #[test]
    fn test_scaling_uses_frozen_params() {
        let mut params = ScalerParams::identity();
        params.mean[3] = 100.0;
        params.scale[3] = 50.0;
        params.scale[5] = 0.0; // constant column at training time
        let normalizer = Normalizer::new(params).unwrap();

        let mut cells = zeros();
        cells[3] = Cell::Numeric(200.0);
        cells[5] = Cell::Numeric(7.0);

        let (_, single, _) = normalizer.normalize_batch(&[row(cells.clone())]).unwrap();
        assert_eq!(single[[0, 3]], 2.0);
        assert_eq!(single[[0, 5]], 7.0);

        // Adding other rows must not change how the first row is scaled
        let mut other = zeros();
        other[3] = Cell::Numeric(10_000.0);
        let (_, batch, _) = normalizer
            .normalize_batch(&[row(cells), row(other.clone()), row(other)])
            .unwrap();
        assert_eq!(batch.row(0), single.row(0));
    }

    #[test]
    fn test_batch_shape() {
        let normalizer = Normalizer::new(ScalerParams::identity()).unwrap();
        let (encoded, matrix, _) = normalizer
            .normalize_batch(&[row(zeros()), row(zeros())])
            .unwrap();
        assert_eq!(encoded.len(), 2);
        assert_eq!(matrix.dim(), (2, FEATURE_COUNT));

        let (_, empty, _) = normalizer.normalize_batch(&[]).unwrap();
        assert_eq!(empty.dim(), (0, FEATURE_COUNT));
    }

    #[test]
    fn test_scaler_width_validated() {
        let params = ScalerParams { mean: vec![0.0; 9], scale: vec![1.0; 9] };
        let err = Normalizer::new(params).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }
}
