//! Raw Record - one observed packet or flow
//!
//! Attributes không đồng nhất: string, number, timestamp hoặc null.
//! Immutable sau khi tạo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single raw attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Null,
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl RawValue {
    /// Parse one tabular cell
    ///
    /// Empty cells and the usual null spellings become `Null`. Anything that
    /// parses as a finite number is a `Number`; everything else is kept as
    /// trimmed text and left for the reconciler to judge.
    pub fn from_cell(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return RawValue::Null;
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "nan" | "null" | "none" | "n/a" => return RawValue::Null,
            _ => {}
        }

        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => RawValue::Number(v),
            _ => RawValue::Text(trimmed.to_string()),
        }
    }

    /// Convert a JSON value from a live record stream
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RawValue::Null,
            serde_json::Value::Bool(b) => RawValue::Number(if *b { 1.0 } else { 0.0 }),
            serde_json::Value::Number(n) => n
                .as_f64()
                .filter(|v| v.is_finite())
                .map(RawValue::Number)
                .unwrap_or(RawValue::Null),
            serde_json::Value::String(s) => RawValue::from_cell(s),
            // Nested structures carry nothing the schema can use
            other => RawValue::Text(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Numeric view, if one exists without guessing
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) if v.is_finite() => Some(*v),
            RawValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            RawValue::Timestamp(ts) => Some(ts.timestamp() as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Null => Ok(()),
            RawValue::Number(v) => write!(f, "{}", v),
            RawValue::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.6f")),
            RawValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One observed packet or flow
///
/// Fields keep the order the source delivered them in (header order for
/// tables). Lookups through [`RawRecord::get`] ignore case and surrounding
/// whitespace and return the first matching field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    fields: Vec<(String, RawValue)>,
}

impl RawRecord {
    pub fn from_pairs<K, I>(pairs: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, RawValue)>,
    {
        Self {
            fields: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Build from a JSON object (live record stream)
    pub fn from_json_object(object: &serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            fields: object
                .iter()
                .map(|(k, v)| (k.clone(), RawValue::from_json(v)))
                .collect(),
        }
    }

    /// Case-insensitive, whitespace-trimmed lookup; first match wins
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        let wanted = name.trim();
        self.fields
            .iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, v)| v)
    }

    /// First non-null value among several candidate keys
    pub fn get_any(&self, names: &[&str]) -> Option<&RawValue> {
        names
            .iter()
            .filter_map(|n| self.get(n))
            .find(|v| !v.is_null())
    }

    /// Fields in source order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}
