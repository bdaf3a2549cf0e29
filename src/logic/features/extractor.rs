//! Packet Feature Extraction
//!
//! Trích xuất attribute map từ một raw record (timestamp, length, endpoints,
//! ports, protocol). Pure function, không side effects.

use std::net::IpAddr;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::logic::capture::{RawRecord, RawValue};

// Aliases used by common capture tooling for the same attribute
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "sniff_time", "time", "frame.time_epoch"];
const LENGTH_KEYS: &[&str] = &["length", "frame.len", "frame_len", "len"];
const SRC_IP_KEYS: &[&str] = &["src_ip", "ip.src", "ipv6.src", "source"];
const DST_IP_KEYS: &[&str] = &["dst_ip", "ip.dst", "ipv6.dst", "destination"];
const PROTOCOL_KEYS: &[&str] = &["protocol", "transport_layer", "proto"];
const SRC_PORT_KEYS: &[&str] = &["src_port", "srcport", "tcp.srcport", "udp.srcport", "sport"];
const DST_PORT_KEYS: &[&str] = &["dst_port", "dstport", "tcp.dstport", "udp.dstport", "dport"];

/// Text timestamp formats, tried in order after RFC 3339
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Attributes derived from one packet
///
/// Optional fields are `None` when the packet does not carry them (no IP
/// layer, no transport layer). They are never filled with placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketAttributes {
    pub timestamp: DateTime<Utc>,
    pub length: u32,
    pub src_ip: Option<IpAddr>,
    pub dst_ip: Option<IpAddr>,
    pub protocol: Option<String>,
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
}

impl PacketAttributes {
    /// Present attributes as `(name, value)` pairs for the reconciler
    pub fn fields(&self) -> Vec<(&'static str, RawValue)> {
        let mut fields = vec![
            ("timestamp", RawValue::Timestamp(self.timestamp)),
            ("length", RawValue::Number(self.length as f64)),
        ];

        if let Some(ip) = self.src_ip {
            fields.push(("src_ip", RawValue::Text(ip.to_string())));
        }
        if let Some(ip) = self.dst_ip {
            fields.push(("dst_ip", RawValue::Text(ip.to_string())));
        }
        if let Some(proto) = &self.protocol {
            fields.push(("protocol", RawValue::Text(proto.clone())));
        }
        if let Some(port) = self.src_port {
            fields.push(("src_port", RawValue::Number(port as f64)));
        }
        if let Some(port) = self.dst_port {
            fields.push(("dst_port", RawValue::Number(port as f64)));
        }

        fields
    }
}

/// Trait for extractors (one per capture library record shape)
pub trait FeatureExtractor {
    /// `None` means the record is not meaningful and should be skipped
    fn extract(&self, record: &RawRecord) -> Option<PacketAttributes>;
}

/// Extractor for packet records as delivered by packet sniffers
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketExtractor;

impl FeatureExtractor for PacketExtractor {
    fn extract(&self, record: &RawRecord) -> Option<PacketAttributes> {
        let timestamp = record.get_any(TIMESTAMP_KEYS).and_then(parse_timestamp)?;
        let length = record.get_any(LENGTH_KEYS).and_then(parse_length)?;

        let protocol = record.get_any(PROTOCOL_KEYS).and_then(parse_protocol);

        // Ports only exist when there is a transport layer
        let (src_port, dst_port) = if protocol.is_some() {
            (
                record.get_any(SRC_PORT_KEYS).and_then(parse_port),
                record.get_any(DST_PORT_KEYS).and_then(parse_port),
            )
        } else {
            (None, None)
        };

        Some(PacketAttributes {
            timestamp,
            length,
            src_ip: record.get_any(SRC_IP_KEYS).and_then(parse_ip),
            dst_ip: record.get_any(DST_IP_KEYS).and_then(parse_ip),
            protocol,
            src_port,
            dst_port,
        })
    }
}

// ============================================================================
// VALUE PARSERS
// ============================================================================

pub fn parse_timestamp(value: &RawValue) -> Option<DateTime<Utc>> {
    match value {
        RawValue::Timestamp(ts) => Some(*ts),
        RawValue::Number(secs) => from_epoch_secs(*secs),
        RawValue::Text(text) => {
            let text = text.trim();
            if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
                return Some(ts.with_timezone(&Utc));
            }
            TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|naive| naive.and_utc())
                .or_else(|| text.parse::<f64>().ok().and_then(from_epoch_secs))
        }
        RawValue::Null => None,
    }
}

fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn parse_length(value: &RawValue) -> Option<u32> {
    let len = match value {
        RawValue::Timestamp(_) => return None,
        other => other.as_f64()?,
    };
    if len < 0.0 || len > u32::MAX as f64 {
        return None;
    }
    Some(len.round() as u32)
}

fn parse_port(value: &RawValue) -> Option<u16> {
    let port = match value {
        RawValue::Timestamp(_) => return None,
        other => other.as_f64()?,
    };
    if port.fract() != 0.0 || !(0.0..=u16::MAX as f64).contains(&port) {
        return None;
    }
    Some(port as u16)
}

fn parse_ip(value: &RawValue) -> Option<IpAddr> {
    value.as_text().and_then(|s| s.trim().parse().ok())
}

fn parse_protocol(value: &RawValue) -> Option<String> {
    match value {
        RawValue::Text(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        RawValue::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(format!("{}", *n as i64)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(pairs: Vec<(&str, RawValue)>) -> RawRecord {
        RawRecord::from_pairs(pairs)
    }

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn test_full_tcp_packet() {
        let record = packet(vec![
            ("sniff_time", text("2025-02-10 14:23:11.250000")),
            ("length", text("60")),
            ("ip.src", text("192.168.1.10")),
            ("ip.dst", text("10.0.0.1")),
            ("transport_layer", text("TCP")),
            ("srcport", text("51234")),
            ("dstport", text("443")),
        ]);

        let attrs = PacketExtractor.extract(&record).unwrap();
        assert_eq!(attrs.length, 60);
        assert_eq!(attrs.src_ip, Some("192.168.1.10".parse().unwrap()));
        assert_eq!(attrs.protocol.as_deref(), Some("TCP"));
        assert_eq!(attrs.src_port, Some(51234));
        assert_eq!(attrs.dst_port, Some(443));
        assert_eq!(attrs.timestamp.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_no_transport_layer_omits_ports() {
        let record = packet(vec![
            ("timestamp", RawValue::Number(1_700_000_000.0)),
            ("length", RawValue::Number(42.0)),
            ("src_port", RawValue::Number(80.0)),
        ]);

        let attrs = PacketExtractor.extract(&record).unwrap();
        assert_eq!(attrs.protocol, None);
        assert_eq!(attrs.src_port, None);
        assert_eq!(attrs.dst_port, None);
        assert_eq!(attrs.src_ip, None);

        let names: Vec<_> = attrs.fields().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["timestamp", "length"]);
    }

    #[test]
    fn test_missing_timestamp_or_length_yields_none() {
        let no_time = packet(vec![("length", RawValue::Number(60.0))]);
        assert!(PacketExtractor.extract(&no_time).is_none());

        let bad_time = packet(vec![
            ("timestamp", text("yesterday")),
            ("length", RawValue::Number(60.0)),
        ]);
        assert!(PacketExtractor.extract(&bad_time).is_none());

        let no_len = packet(vec![("timestamp", RawValue::Number(1.0))]);
        assert!(PacketExtractor.extract(&no_len).is_none());
    }

    #[test]
    fn test_timestamp_formats() {
        for raw in [
            "2024-03-01T10:00:00Z",
            "2024-03-01 10:00:00",
            "01/03/2024 10:00:00",
            "01/03/2024 10:00",
        ] {
            let ts = parse_timestamp(&text(raw)).unwrap();
            assert_eq!(ts.format("%Y-%m-%d %H:%M").to_string(), "2024-03-01 10:00", "{}", raw);
        }
    }

    #[test]
    fn test_bad_port_is_omitted() {
        let record = packet(vec![
            ("timestamp", RawValue::Number(1.0)),
            ("length", RawValue::Number(60.0)),
            ("protocol", text("UDP")),
            ("src_port", text("70000")),
            ("dst_port", text("53")),
        ]);

        let attrs = PacketExtractor.extract(&record).unwrap();
        assert_eq!(attrs.src_port, None);
        assert_eq!(attrs.dst_port, Some(53));
    }

    #[test]
    fn test_numeric_protocol_kept_as_token() {
        let record = packet(vec![
            ("timestamp", RawValue::Number(1.0)),
            ("length", RawValue::Number(60.0)),
            ("protocol", RawValue::Number(17.0)),
        ]);
        let attrs = PacketExtractor.extract(&record).unwrap();
        assert_eq!(attrs.protocol.as_deref(), Some("17"));
    }
}
