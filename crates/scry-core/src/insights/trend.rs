//! Trend worker - 1-D regression significance
//!
//! Applicable only to single-dimension views. Rows are ordered by the
//! dimension's value, the dimension is mapped to integer codes (one per
//! distinct value, in sorted order), and each measure is regressed on the
//! codes. Significance is the mean per-measure `R^2 * (1 - p)`.

use crate::cube::Cuboid;
use crate::dataset::Value;
use crate::error::Result;
use crate::insights::ensemble::InsightWorker;
use crate::insights::types::{WorkerResult, WorkerType};
use crate::stats::fit_line;

pub struct TrendWorker;

impl InsightWorker for TrendWorker {
    fn name(&self) -> &str {
        WorkerType::Trend.as_str()
    }

    fn score(
        &self,
        cuboid: &Cuboid,
        dimensions: &[String],
        measures: &[String],
    ) -> Result<Option<WorkerResult>> {
        if dimensions.len() != 1 || cuboid.rows.len() < 3 {
            return Ok(None);
        }
        let dimension = &dimensions[0];

        let mut ordered: Vec<&crate::dataset::Row> = cuboid.rows.iter().collect();
        ordered.sort_by(|a, b| {
            let va = a.get(dimension).unwrap_or(&Value::Null);
            let vb = b.get(dimension).unwrap_or(&Value::Null);
            va.total_cmp(vb)
        });

        // one integer code per distinct dimension value, ascending
        let mut codes: Vec<f64> = Vec::with_capacity(ordered.len());
        let mut code = 0.0;
        for (i, row) in ordered.iter().enumerate() {
            if i > 0 {
                let prev = ordered[i - 1].get(dimension).unwrap_or(&Value::Null);
                let curr = row.get(dimension).unwrap_or(&Value::Null);
                if prev.total_cmp(curr) != std::cmp::Ordering::Equal {
                    code += 1.0;
                }
            }
            codes.push(code);
        }

        let mut total = 0.0;
        let mut fitted = 0usize;
        for measure in measures {
            let pairs: Vec<(f64, f64)> = ordered
                .iter()
                .zip(codes.iter())
                .filter_map(|(row, &x)| {
                    row.get(measure).and_then(Value::as_number).map(|y| (x, y))
                })
                .collect();
            let xs: Vec<f64> = pairs.iter().map(|(x, _)| *x).collect();
            let ys: Vec<f64> = pairs.iter().map(|(_, y)| *y).collect();
            if let Some(model) = fit_line(&xs, &ys) {
                total += model.significance();
                fitted += 1;
            }
        }
        if fitted == 0 {
            return Ok(None);
        }

        Ok(Some(WorkerResult {
            significance: (total / fitted as f64).clamp(0.0, 1.0),
            description: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Row;

    fn monotone_cuboid() -> Cuboid {
        let mut rows = Vec::new();
        for i in 0..12 {
            let mut row = Row::new();
            row.insert("month".to_string(), Value::Number(i as f64));
            row.insert("revenue".to_string(), Value::Number(50.0 * i as f64 + 10.0));
            rows.push(row);
        }
        Cuboid {
            dimensions: vec!["month".to_string()],
            rows,
        }
    }

    #[test]
    fn test_strong_trend_scores_high() {
        let worker = TrendWorker;
        let result = worker
            .score(
                &monotone_cuboid(),
                &["month".to_string()],
                &["revenue".to_string()],
            )
            .unwrap()
            .unwrap();
        assert!(result.significance > 0.8, "got {}", result.significance);
    }

    #[test]
    fn test_multi_dimension_view_not_applicable() {
        let worker = TrendWorker;
        let result = worker
            .score(
                &monotone_cuboid(),
                &["month".to_string(), "city".to_string()],
                &["revenue".to_string()],
            )
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_flat_series_scores_low() {
        let mut cuboid = monotone_cuboid();
        for row in &mut cuboid.rows {
            row.insert("revenue".to_string(), Value::Number(5.0));
        }
        let worker = TrendWorker;
        let result = worker
            .score(&cuboid, &["month".to_string()], &["revenue".to_string()])
            .unwrap()
            .unwrap();
        assert!(result.significance < 0.01);
    }
}
