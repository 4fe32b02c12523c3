//! Typed row model for in-memory datasets
//!
//! Rows are maps from field key to a scalar [`Value`]. The analytic typing
//! (dimension vs measure) is decided once at ingestion by the field catalog,
//! so downstream components never re-inspect raw types.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Label used to group rows whose dimension value is missing.
pub const NULL_GROUP_LABEL: &str = "others";

/// A single scalar cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. `Null` and text yield `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Canonical label used for group-by keys and category coding.
    ///
    /// Missing values collapse into a shared bucket rather than forming
    /// one group per row.
    pub fn label(&self) -> String {
        match self {
            Value::Null => NULL_GROUP_LABEL.to_string(),
            Value::Number(n) => format!("{}", n),
            Value::Text(s) => s.clone(),
        }
    }

    /// Total ordering across variants: nulls first, then numbers, then text.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Number(_), Value::Text(_)) => Ordering::Less,
            (Value::Text(_), Value::Number(_)) => Ordering::Greater,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// One dataset row: field key -> scalar value.
pub type Row = HashMap<String, Value>;

/// Extract the numeric column for `key`, skipping nulls and text cells.
pub fn numeric_column(rows: &[Row], key: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|r| r.get(key).and_then(Value::as_number))
        .collect()
}

/// Extract the label column for `key`. Missing cells map to the null bucket.
pub fn label_column(rows: &[Row], key: &str) -> Vec<String> {
    rows.iter()
        .map(|r| r.get(key).map_or_else(|| NULL_GROUP_LABEL.to_string(), Value::label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ordering() {
        let mut values = vec![
            Value::Text("b".into()),
            Value::Number(3.0),
            Value::Null,
            Value::Number(-1.0),
            Value::Text("a".into()),
        ];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Number(-1.0),
                Value::Number(3.0),
                Value::Text("a".into()),
                Value::Text("b".into()),
            ]
        );
    }

    #[test]
    fn test_null_label_bucket() {
        assert_eq!(Value::Null.label(), NULL_GROUP_LABEL);
        assert_eq!(Value::Number(2.5).label(), "2.5");
        assert_eq!(Value::Text("east".into()).label(), "east");
    }

    #[test]
    fn test_numeric_column_skips_non_numbers() {
        let rows: Vec<Row> = vec![
            HashMap::from([("m".to_string(), Value::Number(1.0))]),
            HashMap::from([("m".to_string(), Value::Null)]),
            HashMap::from([("m".to_string(), Value::Text("n/a".into()))]),
            HashMap::from([("m".to_string(), Value::Number(4.0))]),
        ];
        assert_eq!(numeric_column(&rows, "m"), vec![1.0, 4.0]);
    }

    #[test]
    fn test_value_json_round_trip() {
        let v: Value = serde_json::from_str("3.5").unwrap();
        assert_eq!(v, Value::Number(3.5));
        let v: Value = serde_json::from_str("\"west\"").unwrap();
        assert_eq!(v, Value::Text("west".into()));
        let v: Value = serde_json::from_str("null").unwrap();
        assert!(v.is_null());
    }
}
