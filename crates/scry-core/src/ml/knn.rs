//! K-nearest-neighbor group homogeneity
//!
//! Measures whether rows that are close in feature space also agree on a
//! held-out categorical target. Numeric features are min-max scaled;
//! categorical features are compared by equality, a mismatch contributing a
//! fixed penalty instead of a numeric delta.

use crate::dataset::{Row, Value};

/// Default neighborhood size for the group worker.
pub const DEFAULT_K: usize = 8;

/// Penalty added to the squared distance when two rows disagree on a
/// categorical feature.
const MISMATCH_PENALTY: f64 = 1.0;

/// Average fraction of each row's K nearest neighbors that share the row's
/// value on every target field.
///
/// Returns `None` when there are fewer than two rows or nothing to vote on.
pub fn group_homogeneity(
    rows: &[Row],
    numeric_features: &[String],
    categorical_features: &[String],
    targets: &[String],
    k: usize,
) -> Option<f64> {
    if rows.len() < 2 || targets.is_empty() || k == 0 {
        return None;
    }

    let numeric = scale_numeric(rows, numeric_features);
    let categorical: Vec<Vec<String>> = categorical_features
        .iter()
        .map(|f| label_values(rows, f))
        .collect();
    let target_labels: Vec<Vec<String>> = targets.iter().map(|f| label_values(rows, f)).collect();

    let n = rows.len();
    let k = k.min(n - 1);
    let mut total = 0.0;

    for i in 0..n {
        let mut distances: Vec<(f64, usize)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (distance(&numeric, &categorical, i, j), j))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));
        let neighbors = &distances[..k];

        let mut agreement = 0.0;
        for labels in &target_labels {
            let own = &labels[i];
            let share = neighbors
                .iter()
                .filter(|(_, j)| &labels[*j] == own)
                .count() as f64
                / k as f64;
            agreement += share;
        }
        total += agreement / target_labels.len() as f64;
    }

    Some(total / n as f64)
}

fn distance(numeric: &[Vec<f64>], categorical: &[Vec<String>], i: usize, j: usize) -> f64 {
    let mut dis = 0.0;
    for column in numeric {
        let delta = column[i] - column[j];
        if delta.is_finite() {
            dis += delta * delta;
        }
    }
    for column in categorical {
        if column[i] != column[j] {
            dis += MISMATCH_PENALTY * MISMATCH_PENALTY;
        }
    }
    dis
}

/// Min-max scale each numeric column into [0, 1]. Missing cells become NaN
/// and drop out of the distance; a constant column scales to all zeros.
fn scale_numeric(rows: &[Row], features: &[String]) -> Vec<Vec<f64>> {
    features
        .iter()
        .map(|f| {
            let raw: Vec<f64> = rows
                .iter()
                .map(|r| {
                    r.get(f)
                        .and_then(Value::as_number)
                        .unwrap_or(f64::NAN)
                })
                .collect();
            let min = raw.iter().cloned().filter(|v| v.is_finite()).fold(f64::INFINITY, f64::min);
            let max = raw
                .iter()
                .cloned()
                .filter(|v| v.is_finite())
                .fold(f64::NEG_INFINITY, f64::max);
            let span = max - min;
            raw.iter()
                .map(|&v| {
                    if !v.is_finite() {
                        f64::NAN
                    } else if span > 0.0 {
                        (v - min) / span
                    } else {
                        0.0
                    }
                })
                .collect()
        })
        .collect()
}

fn label_values(rows: &[Row], field: &str) -> Vec<String> {
    rows.iter()
        .map(|r| r.get(field).map_or_else(|| Value::Null.label(), Value::label))
        .collect()
}
