//! Correlation graph - pairwise association between fields
//!
//! Two flavors, both producing a dense symmetric [`AssociationMatrix`]:
//! - dimensions: Cramér's V from a chi-squared statistic over a sparse
//!   contingency count (only observed value pairs are stored, so large
//!   domains never allocate a |domain_x| x |domain_y| table)
//! - measures: Pearson correlation over the raw numeric columns
//!
//! Pure functions of the rows and field list; deterministic.

use std::collections::HashMap;

use serde::Serialize;

use crate::dataset::{label_column, Row};

/// Square symmetric association matrix over an ordered field list.
/// Diagonal entries are 1.
#[derive(Debug, Clone, Serialize)]
pub struct AssociationMatrix {
    pub fields: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl AssociationMatrix {
    pub fn size(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i][j]
    }
}

/// Association strength in [0, 1] between all dimension pairs (Cramér's V).
pub fn build_dimension_graph(rows: &[Row], dimensions: &[String]) -> AssociationMatrix {
    build_matrix(dimensions, |x, y| cramers_v(rows, x, y))
}

/// Signed linear correlation in [-1, 1] between all measure pairs (Pearson).
pub fn build_measure_graph(rows: &[Row], measures: &[String]) -> AssociationMatrix {
    build_matrix(measures, |x, y| pearson(rows, x, y))
}

fn build_matrix<F: Fn(&str, &str) -> f64>(fields: &[String], assoc: F) -> AssociationMatrix {
    let n = fields.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
        for j in (i + 1)..n {
            let v = assoc(&fields[i], &fields[j]);
            let v = if v.is_finite() { v } else { 0.0 };
            values[i][j] = v;
            values[j][i] = v;
        }
    }
    AssociationMatrix {
        fields: fields.to_vec(),
        values,
    }
}

/// Cramér's V between two categorical fields.
///
/// `sqrt(chi^2 / (N * min(|dx|-1, |dy|-1)))`, with 0 when either field has
/// a single-value domain (the min term would be 0).
pub fn cramers_v(rows: &[Row], field_x: &str, field_y: &str) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let xs = label_column(rows, field_x);
    let ys = label_column(rows, field_y);

    // sparse contingency: only observed (x, y) pairs are counted
    let mut joint: HashMap<(String, String), f64> = HashMap::new();
    let mut row_sums: HashMap<String, f64> = HashMap::new();
    let mut col_sums: HashMap<String, f64> = HashMap::new();
    for (x, y) in xs.iter().zip(ys.iter()) {
        *joint.entry((x.clone(), y.clone())).or_insert(0.0) += 1.0;
        *row_sums.entry(x.clone()).or_insert(0.0) += 1.0;
        *col_sums.entry(y.clone()).or_insert(0.0) += 1.0;
    }

    let degrees = (row_sums.len().saturating_sub(1)).min(col_sums.len().saturating_sub(1));
    if degrees == 0 {
        return 0.0;
    }

    let total: f64 = rows.len() as f64;
    let mut chi_squared = 0.0;
    let mut expected_seen = 0.0;
    for ((x, y), observed) in &joint {
        let expected = row_sums[x] * col_sums[y] / total;
        expected_seen += expected;
        chi_squared += (observed - expected).powi(2) / expected;
    }
    // every unobserved (x, y) cell contributes (0 - e)^2 / e = e; their
    // expected counts sum to N minus what the observed cells account for,
    // so the dense-table statistic comes out of the sparse counts exactly
    chi_squared += total - expected_seen;

    (chi_squared / (total * degrees as f64)).sqrt().min(1.0)
}

/// Pearson correlation coefficient between two numeric fields.
/// Zero-variance columns yield 0 rather than NaN.
pub fn pearson(rows: &[Row], field_x: &str, field_y: &str) -> f64 {
    // pair up only rows where both cells are numeric
    let pairs: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| {
            let x = r.get(field_x).and_then(|v| v.as_number())?;
            let y = r.get(field_y).and_then(|v| v.as_number())?;
            Some((x, y))
        })
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let x_bar = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let y_bar = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let covariance: f64 = pairs
        .iter()
        .map(|(x, y)| (x - x_bar) * (y - y_bar))
        .sum();
    let x_var: f64 = pairs.iter().map(|(x, _)| (x - x_bar).powi(2)).sum();
    let y_var: f64 = pairs.iter().map(|(_, y)| (y - y_bar).powi(2)).sum();

    let denominator = (x_var * y_var).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (covariance / denominator).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Value;

    fn make_rows(columns: &[(&str, Vec<Value>)]) -> Vec<Row> {
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
    fn test_cramers_v_of_identical_fields() {
        let values: Vec<Value> = (0..60)
            .map(|i| Value::Text(format!("c{}", i % 3)))
            .collect();
        let rows = make_rows(&[("a", values.clone()), ("b", values)]);
        let v = cramers_v(&rows, "a", "b");
        assert!(v > 0.99, "identical fields should be fully associated, got {}", v);
    }

    #[test]
    fn test_cramers_v_single_domain_guard() {
        let rows = make_rows(&[
            ("a", vec!["x".into(), "x".into(), "x".into()]),
            ("b", vec!["p".into(), "q".into(), "p".into()]),
        ]);
        assert_eq!(cramers_v(&rows, "a", "b"), 0.0);
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let xs: Vec<Value> = (0..30).map(|i| Value::Number(i as f64)).collect();
        let ys: Vec<Value> = (0..30).map(|i| Value::Number(3.0 * i as f64 + 1.0)).collect();
        let rows = make_rows(&[("x", xs), ("y", ys)]);
        assert!((pearson(&rows, "x", "y") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_pearson_zero_variance_guard() {
        let rows = make_rows(&[
            ("x", vec![2.0.into(), 2.0.into(), 2.0.into()]),
            ("y", vec![1.0.into(), 5.0.into(), 9.0.into()]),
        ]);
        assert_eq!(pearson(&rows, "x", "y"), 0.0);
    }

    #[test]
    fn test_matrix_shape_properties() {
        let rows = make_rows(&[
            ("a", (0..50).map(|i| Value::Text(format!("a{}", i % 4))).collect()),
            ("b", (0..50).map(|i| Value::Text(format!("b{}", i % 4))).collect()),
            ("c", (0..50).map(|i| Value::Text(format!("c{}", (i / 2) % 5))).collect()),
        ]);
        let dims: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let matrix = build_dimension_graph(&rows, &dims);
        assert_eq!(matrix.size(), 3);
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 1.0);
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
                assert!((0.0..=1.0).contains(&matrix.get(i, j)));
            }
        }
    }

    #[test]
    fn test_measure_matrix_in_range() {
        let rows = make_rows(&[
            ("x", (0..40).map(|i| Value::Number((i * 7 % 13) as f64)).collect()),
            ("y", (0..40).map(|i| Value::Number((i * 3 % 11) as f64)).collect()),
        ]);
        let meas: Vec<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let matrix = build_measure_graph(&rows, &meas);
        for i in 0..2 {
            for j in 0..2 {
                assert!((-1.0..=1.0).contains(&matrix.get(i, j)));
            }
        }
    }
}
