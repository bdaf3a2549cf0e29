//! Schema Reconciler
//!
//! Ghép các fields thực sự có (từ extractor hoặc bảng CSV) vào Feature Schema
//! cố định mà classifier yêu cầu.
//!
//! Policy:
//! - schema field không có trong input → `Numeric(0.0)`, được đếm là *defaulted*
//! - input field không thuộc schema → bỏ qua, được đếm là *dropped*
//! - giá trị không coerce được → `Missing`, normalizer sẽ fill
//!
//! Không có error nào thoát ra khỏi stage này.

use serde::{Deserialize, Serialize};

use crate::logic::capture::RawValue;
use super::layout::{
    feature_index, feature_name, is_categorical, FEATURE_COUNT,
};

/// One reconciled slot
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Numeric(f64),
    /// Well-formed categorical token, encoded later by the normalizer
    Categorical(String),
    Missing,
}

impl Cell {
    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

/// A record reshaped into schema order, not yet encoded or scaled
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    /// Position of the originating record in the input sequence
    pub position: usize,
    pub cells: [Cell; FEATURE_COUNT],
}

impl ReconciledRow {
    pub fn width(&self) -> usize {
        self.cells.len()
    }
}

/// Per-run reconciliation counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub rows: usize,
    /// Schema slots synthesized with the default value
    pub defaulted_fields: usize,
    /// Defaulted count per schema field, in schema order
    pub defaulted_by_field: Vec<usize>,
    /// Input fields ignored because the schema does not know them
    pub dropped_fields: usize,
    /// Present values that could not be coerced and became missing
    pub coerced_missing: usize,
}

impl ReconcileStats {
    pub fn new() -> Self {
        Self {
            defaulted_by_field: vec![0; FEATURE_COUNT],
            ..Default::default()
        }
    }

    /// True when the classifier saw fewer real attributes than it was trained on
    pub fn is_degraded(&self) -> bool {
        self.defaulted_fields > 0 || self.coerced_missing > 0
    }

    /// Schema fields that were defaulted at least once, with counts
    pub fn defaulted_summary(&self) -> Vec<(&'static str, usize)> {
        self.defaulted_by_field
            .iter()
            .enumerate()
            .filter(|(_, &n)| n > 0)
            .filter_map(|(i, &n)| feature_name(i).map(|name| (name, n)))
            .collect()
    }
}

#[derive(Debug)]
pub struct SchemaReconciler {
    default_value: f64,
    stats: ReconcileStats,
}

impl SchemaReconciler {
    pub fn new() -> Self {
        Self {
            default_value: 0.0,
            stats: ReconcileStats::new(),
        }
    }

    /// Reshape one record's named fields into schema order
    pub fn reconcile<'a, K, I>(&mut self, position: usize, fields: I) -> ReconciledRow
    where
        K: AsRef<str> + 'a,
        I: IntoIterator<Item = (K, &'a RawValue)>,
    {
        let mut slots: [Option<Cell>; FEATURE_COUNT] = Default::default();

        for (name, value) in fields {
            let Some(index) = feature_index(name.as_ref()) else {
                self.stats.dropped_fields += 1;
                continue;
            };

            // Duplicate after normalization: first occurrence wins
            if slots[index].is_some() {
                self.stats.dropped_fields += 1;
                continue;
            }

            let cell = coerce(index, value);
            if cell.is_missing() {
                self.stats.coerced_missing += 1;
            }
            slots[index] = Some(cell);
        }

        let default_value = self.default_value;
        let stats = &mut self.stats;
        let cells: [Cell; FEATURE_COUNT] = std::array::from_fn(|i| {
            slots[i].take().unwrap_or_else(|| {
                stats.defaulted_fields += 1;
                stats.defaulted_by_field[i] += 1;
                Cell::Numeric(default_value)
            })
        });

        stats.rows += 1;
        ReconciledRow { position, cells }
    }

    pub fn stats(&self) -> &ReconcileStats {
        &self.stats
    }

    pub fn into_stats(self) -> ReconcileStats {
        self.stats
    }
}

impl Default for SchemaReconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// Coerce a raw value for the given schema slot
fn coerce(index: usize, value: &RawValue) -> Cell {
    match value {
        RawValue::Null => Cell::Missing,
        RawValue::Number(v) if v.is_finite() => Cell::Numeric(*v),
        RawValue::Number(_) => Cell::Missing,
        RawValue::Timestamp(ts) => Cell::Numeric(ts.timestamp() as f64),
        RawValue::Text(text) => {
            let text = text.trim();
            match text.parse::<f64>() {
                Ok(v) if v.is_finite() => Cell::Numeric(v),
                _ if is_categorical(index) && is_token(text) => {
                    Cell::Categorical(text.to_string())
                }
                _ => Cell::Missing,
            }
        }
    }
}

/// Protocol-like token: letters/digits with optional `-`, `_`, `.`
fn is_token(text: &str) -> bool {
    !text.is_empty()
        && text.chars().any(|c| c.is_ascii_alphabetic())
        && text.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> RawValue {
        RawValue::Number(v)
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let fields = vec![("protocol", num(6.0)), ("length", num(60.0))];
        let mut reconciler = SchemaReconciler::new();
        let row = reconciler.reconcile(0, fields.iter().map(|(k, v)| (*k, v)));

        assert_eq!(row.width(), FEATURE_COUNT);
        assert_eq!(row.cells[0], Cell::Numeric(6.0));
        assert_eq!(row.cells[3], Cell::Numeric(60.0));
        for i in [1, 2, 4, 5, 6, 7, 8, 9, 10, 11] {
            assert_eq!(row.cells[i], Cell::Numeric(0.0), "slot {}", i);
        }

        let stats = reconciler.stats();
        assert_eq!(stats.defaulted_fields, 10);
        assert_eq!(stats.defaulted_by_field[4], 1);
        assert!(stats.is_degraded());
    }

    #[test]
    fn test_names_are_trimmed_and_case_folded() {
        let fields = vec![
            (" Flow Duration ", num(12.0)),
            ("TOTAL FWD PACKET", num(3.0)),
            ("Packet Length Mean", num(512.5)),
        ];
        let mut reconciler = SchemaReconciler::new();
        let row = reconciler.reconcile(0, fields.iter().map(|(k, v)| (*k, v)));

        assert_eq!(row.cells[4], Cell::Numeric(12.0));
        assert_eq!(row.cells[5], Cell::Numeric(3.0));
        assert_eq!(row.cells[11], Cell::Numeric(512.5));
        assert_eq!(reconciler.stats().dropped_fields, 0);
    }

    #[test]
    fn test_unknown_fields_dropped() {
        let fields = vec![
            ("timestamp", num(1.0)),
            ("src_ip", text("10.0.0.1")),
            ("length", num(60.0)),
        ];
        let mut reconciler = SchemaReconciler::new();
        let row = reconciler.reconcile(0, fields.iter().map(|(k, v)| (*k, v)));

        assert_eq!(row.cells[3], Cell::Numeric(60.0));
        assert_eq!(reconciler.stats().dropped_fields, 2);
    }

    #[test]
    fn test_protocol_tokens() {
        let mut reconciler = SchemaReconciler::new();

        let tcp = [("protocol", text("TCP"))];
        let row = reconciler.reconcile(0, tcp.iter().map(|(k, v)| (*k, v)));
        assert_eq!(row.cells[0], Cell::Categorical("TCP".to_string()));

        let garbage = [("protocol", text("??"))];
        let row = reconciler.reconcile(1, garbage.iter().map(|(k, v)| (*k, v)));
        assert_eq!(row.cells[0], Cell::Missing);
        assert_eq!(reconciler.stats().coerced_missing, 1);
    }

    #[test]
    fn test_non_numeric_measurement_becomes_missing() {
        let fields = [("length", text("sixty")), ("src_port", RawValue::Null)];
        let mut reconciler = SchemaReconciler::new();
        let row = reconciler.reconcile(0, fields.iter().map(|(k, v)| (*k, v)));

        assert_eq!(row.cells[3], Cell::Missing);
        assert_eq!(row.cells[1], Cell::Missing);
        assert_eq!(reconciler.stats().coerced_missing, 2);
        // Present-but-bad is not the same as absent
        assert_eq!(reconciler.stats().defaulted_by_field[3], 0);
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let fields = [("Length", num(60.0)), ("length ", num(99.0))];
        let mut reconciler = SchemaReconciler::new();
        let row = reconciler.reconcile(0, fields.iter().map(|(k, v)| (*k, v)));

        assert_eq!(row.cells[3], Cell::Numeric(60.0));
        assert_eq!(reconciler.stats().dropped_fields, 1);
    }

    #[test]
    fn test_position_preserved() {
        let mut reconciler = SchemaReconciler::new();
        let empty: [(&str, RawValue); 0] = [];
        let row = reconciler.reconcile(7, empty.iter().map(|(k, v)| (*k, v)));
        assert_eq!(row.position, 7);
        assert_eq!(reconciler.stats().defaulted_fields, FEATURE_COUNT);
        assert_eq!(reconciler.stats().defaulted_summary().len(), FEATURE_COUNT);
    }
}
