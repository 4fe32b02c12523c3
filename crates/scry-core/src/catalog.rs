//! Field catalog - classifies raw field keys into dimensions and measures
//!
//! Classification is a pure function of the ingested rows:
//! - all-numeric columns become quantitative measures, unless the domain is
//!   a small set of integers (ordinal dimension)
//! - text columns that parse as dates become temporal dimensions
//! - everything else is a nominal dimension
//!
//! A pre-known dimension/measure split from the caller overrides the
//! inferred analytic type but keeps the inferred semantic type.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dataset::{Row, Value};

/// Integer domains up to this size are treated as ordinal dimensions
/// rather than measures (e.g. rating scales, quarter numbers).
const ORDINAL_CARDINALITY_LIMIT: usize = 16;

/// Whether a field groups rows or gets aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyticType {
    Dimension,
    Measure,
}

impl AnalyticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticType::Dimension => "dimension",
            AnalyticType::Measure => "measure",
        }
    }
}

impl fmt::Display for AnalyticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnalyticType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dimension" => Ok(AnalyticType::Dimension),
            "measure" => Ok(AnalyticType::Measure),
            _ => Err(format!("Unknown analytic type: {}", s)),
        }
    }
}

/// The statistical flavor of a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Quantitative,
    Nominal,
    Ordinal,
    Temporal,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Quantitative => "quantitative",
            SemanticType::Nominal => "nominal",
            SemanticType::Ordinal => "ordinal",
            SemanticType::Temporal => "temporal",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified field. Created once per dataset ingestion, immutable
/// thereafter; downstream components refer to it by key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub key: String,
    pub analytic_type: AnalyticType,
    pub semantic_type: SemanticType,
    /// Number of distinct values observed (the field's domain size).
    pub cardinality: usize,
}

/// The classified field set for one dataset.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl FieldCatalog {
    /// Classify `field_keys` against the ingested rows.
    pub fn classify(rows: &[Row], field_keys: &[String]) -> Self {
        let fields = field_keys.iter().map(|key| classify_field(rows, key)).collect();
        Self::from_fields(fields)
    }

    /// Classify, then force the analytic type of fields named in the
    /// pre-known split. Keys absent from both lists keep the inferred type.
    pub fn classify_with_split(
        rows: &[Row],
        field_keys: &[String],
        dimensions: &[String],
        measures: &[String],
    ) -> Self {
        let mut catalog = Self::classify(rows, field_keys);
        for key in dimensions {
            catalog.override_analytic_type(key, AnalyticType::Dimension);
        }
        for key in measures {
            catalog.override_analytic_type(key, AnalyticType::Measure);
        }
        catalog
    }

    fn from_fields(fields: Vec<Field>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key.clone(), i))
            .collect();
        Self { fields, index }
    }

    /// Flip a field's analytic type in place. Unknown keys are ignored;
    /// the engine validates keys before they reach aggregation.
    pub fn override_analytic_type(&mut self, key: &str, analytic_type: AnalyticType) {
        if let Some(&i) = self.index.get(key) {
            self.fields[i].analytic_type = analytic_type;
        }
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.index.get(key).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Keys of all dimension fields, in catalog order.
    pub fn dimensions(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.analytic_type == AnalyticType::Dimension)
            .map(|f| f.key.clone())
            .collect()
    }

    /// Keys of all measure fields, in catalog order.
    pub fn measures(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| f.analytic_type == AnalyticType::Measure)
            .map(|f| f.key.clone())
            .collect()
    }
}

fn classify_field(rows: &[Row], key: &str) -> Field {
    let mut labels: HashSet<String> = HashSet::new();
    let mut non_null = 0usize;
    let mut numeric = 0usize;
    let mut integral = 0usize;
    let mut date_like = 0usize;

    for row in rows {
        let value = row.get(key).unwrap_or(&Value::Null);
        labels.insert(value.label());
        match value {
            Value::Null => {}
            Value::Number(n) => {
                non_null += 1;
                numeric += 1;
                if n.fract() == 0.0 {
                    integral += 1;
                }
            }
            Value::Text(s) => {
                non_null += 1;
                if parse_date(s) {
                    date_like += 1;
                }
            }
        }
    }

    let cardinality = labels.len();
    let (analytic_type, semantic_type) = if non_null == 0 {
        (AnalyticType::Dimension, SemanticType::Nominal)
    } else if numeric == non_null {
        if integral == non_null && cardinality <= ORDINAL_CARDINALITY_LIMIT {
            (AnalyticType::Dimension, SemanticType::Ordinal)
        } else {
            (AnalyticType::Measure, SemanticType::Quantitative)
        }
    } else if numeric == 0 && date_like == non_null {
        (AnalyticType::Dimension, SemanticType::Temporal)
    } else {
        (AnalyticType::Dimension, SemanticType::Nominal)
    };

    Field {
        key: key.to_string(),
        analytic_type,
        semantic_type,
        cardinality,
    }
}

fn parse_date(s: &str) -> bool {
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
    FORMATS.iter().any(|f| NaiveDate::parse_from_str(s, f).is_ok())
        || chrono::DateTime::parse_from_rfc3339(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows_from(columns: &[(&str, Vec<Value>)]) -> Vec<Row> {
        let len = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
        (0..len)
            .map(|i| {
                columns
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.get(i).cloned().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_numeric_column_is_measure() {
        let rows = rows_from(&[(
            "price",
            vec![1.5.into(), 2.25.into(), 100.0.into(), 7.125.into()],
        )]);
        let catalog = FieldCatalog::classify(&rows, &["price".to_string()]);
        let field = catalog.field("price").unwrap();
        assert_eq!(field.analytic_type, AnalyticType::Measure);
        assert_eq!(field.semantic_type, SemanticType::Quantitative);
        assert_eq!(field.cardinality, 4);
    }

    #[test]
    fn test_small_integer_domain_is_ordinal() {
        let values: Vec<Value> = (0..40).map(|i| Value::Number((i % 4) as f64)).collect();
        let rows = rows_from(&[("quarter", values)]);
        let catalog = FieldCatalog::classify(&rows, &["quarter".to_string()]);
        let field = catalog.field("quarter").unwrap();
        assert_eq!(field.analytic_type, AnalyticType::Dimension);
        assert_eq!(field.semantic_type, SemanticType::Ordinal);
        assert_eq!(field.cardinality, 4);
    }

    #[test]
    fn test_date_column_is_temporal() {
        let rows = rows_from(&[(
            "day",
            vec!["2023-01-01".into(), "2023-01-02".into(), "2023-01-03".into()],
        )]);
        let catalog = FieldCatalog::classify(&rows, &["day".to_string()]);
        let field = catalog.field("day").unwrap();
        assert_eq!(field.analytic_type, AnalyticType::Dimension);
        assert_eq!(field.semantic_type, SemanticType::Temporal);
    }

    #[test]
    fn test_text_column_is_nominal() {
        let rows = rows_from(&[("city", vec!["rome".into(), "oslo".into(), "rome".into()])]);
        let catalog = FieldCatalog::classify(&rows, &["city".to_string()]);
        let field = catalog.field("city").unwrap();
        assert_eq!(field.analytic_type, AnalyticType::Dimension);
        assert_eq!(field.semantic_type, SemanticType::Nominal);
        assert_eq!(field.cardinality, 2);
    }

    #[test]
    fn test_split_overrides_inference() {
        let rows = rows_from(&[(
            "price",
            vec![1.5.into(), 2.25.into(), 3.75.into()],
        )]);
        let catalog = FieldCatalog::classify_with_split(
            &rows,
            &["price".to_string()],
            &["price".to_string()],
            &[],
        );
        assert_eq!(
            catalog.field("price").unwrap().analytic_type,
            AnalyticType::Dimension
        );
        assert_eq!(catalog.measures(), Vec::<String>::new());
    }
}
