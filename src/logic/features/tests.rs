//! Integration Tests for Feature Extraction + Reconciliation
//!
//! Extractor output phải luôn reconcile thành vector đúng 12 slots.

#[cfg(test)]
mod integration_tests {
    use crate::logic::capture::{RawRecord, RawValue};
    use crate::logic::features::{
        layout::feature_index,
        Cell, FeatureExtractor, PacketExtractor, SchemaReconciler, FEATURE_COUNT,
    };

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    /// Live packet attributes land in their schema slots, flow stats default
    #[test]
    fn test_extracted_packet_reconciles_to_schema() {
        let record = RawRecord::from_pairs(vec![
            ("sniff_time", text("2025-02-10 14:23:11")),
            ("length", text("1514")),
            ("ip.src", text("192.168.1.10")),
            ("ip.dst", text("8.8.8.8")),
            ("transport_layer", text("UDP")),
            ("srcport", text("5353")),
            ("dstport", text("53")),
        ]);

        let attrs = PacketExtractor.extract(&record).unwrap();
        let fields = attrs.fields();

        let mut reconciler = SchemaReconciler::new();
        let row = reconciler.reconcile(0, fields.iter().map(|(k, v)| (*k, v)));

        assert_eq!(row.cells.len(), FEATURE_COUNT);
        assert_eq!(row.cells[feature_index("protocol").unwrap()], Cell::Categorical("UDP".into()));
        assert_eq!(row.cells[feature_index("src_port").unwrap()], Cell::Numeric(5353.0));
        assert_eq!(row.cells[feature_index("dst_port").unwrap()], Cell::Numeric(53.0));
        assert_eq!(row.cells[feature_index("length").unwrap()], Cell::Numeric(1514.0));

        let stats = reconciler.stats();
        // 8 flow statistics are not observable on a single packet
        assert_eq!(stats.defaulted_fields, 8);
        // timestamp + two addresses are not schema fields
        assert_eq!(stats.dropped_fields, 3);
    }

    /// Bulk table rows with their own column naming reconcile the same way
    #[test]
    fn test_bulk_row_with_dataset_headers() {
        let record = RawRecord::from_pairs(vec![
            ("Flow Duration", RawValue::Number(1200.0)),
            ("Total Fwd Packet", RawValue::Number(4.0)),
            ("Total Bwd packets", RawValue::Number(2.0)),
            ("Protocol", RawValue::Number(6.0)),
            ("Timestamp", text("01/03/2024 10:00")),
        ]);

        let mut reconciler = SchemaReconciler::new();
        let row = reconciler.reconcile(0, record.iter());

        assert_eq!(row.cells[0], Cell::Numeric(6.0));
        assert_eq!(row.cells[4], Cell::Numeric(1200.0));
        assert_eq!(row.cells[5], Cell::Numeric(4.0));
        assert_eq!(row.cells[6], Cell::Numeric(2.0));
        assert_eq!(reconciler.stats().dropped_fields, 1);
    }

    /// Every stats counter stays consistent over a batch
    #[test]
    fn test_stats_accumulate_over_rows() {
        let mut reconciler = SchemaReconciler::new();
        for i in 0..5 {
            let record = RawRecord::from_pairs(vec![("length", RawValue::Number(60.0 + i as f64))]);
            reconciler.reconcile(i, record.iter());
        }

        let stats = reconciler.into_stats();
        assert_eq!(stats.rows, 5);
        assert_eq!(stats.defaulted_fields, 5 * (FEATURE_COUNT - 1));
        assert_eq!(stats.defaulted_by_field[3], 0);
        assert_eq!(stats.defaulted_by_field[0], 5);
    }
}
