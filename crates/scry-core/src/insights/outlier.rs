//! Outlier worker - isolation-forest anomaly strength
//!
//! Scores every aggregated row of the cuboid and reports the strongest
//! anomaly. The description carries the full extreme row (all dimension
//! and measure values), which is what a consumer renders as "this group is
//! the odd one out".

use std::collections::BTreeMap;

use crate::cube::Cuboid;
use crate::dataset::Value;
use crate::error::Result;
use crate::insights::ensemble::InsightWorker;
use crate::insights::types::{WorkerResult, WorkerType};
use crate::ml::IsolationForest;

pub struct OutlierWorker {
    /// Forest seed; fixed by default so repeated runs rank identically.
    seed: u64,
}

impl OutlierWorker {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for OutlierWorker {
    fn default() -> Self {
        Self::new(0x5ca1_ab1e)
    }
}

impl InsightWorker for OutlierWorker {
    fn name(&self) -> &str {
        WorkerType::Outlier.as_str()
    }

    fn score(
        &self,
        cuboid: &Cuboid,
        dimensions: &[String],
        measures: &[String],
    ) -> Result<Option<WorkerResult>> {
        if cuboid.rows.is_empty() || measures.is_empty() {
            return Ok(None);
        }

        let mut forest = IsolationForest::new(&cuboid.rows, dimensions, measures, self.seed);
        forest.fit();
        let scores = forest.score_all();

        let (max_index, max_score) = scores
            .iter()
            .enumerate()
            .fold((0, 0.0), |(bi, bs), (i, &s)| {
                if s > bs {
                    (i, s)
                } else {
                    (bi, bs)
                }
            });

        let mut description: BTreeMap<String, Value> = BTreeMap::new();
        let extreme = &cuboid.rows[max_index];
        for key in dimensions.iter().chain(measures.iter()) {
            description.insert(
                key.clone(),
                extreme.get(key).cloned().unwrap_or(Value::Null),
            );
        }

        Ok(Some(WorkerResult {
            significance: max_score.clamp(0.0, 1.0),
            description: Some(description),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Row;

    fn cuboid_with_outlier() -> Cuboid {
        let mut rows = Vec::new();
        for i in 0..100 {
            let mut row = Row::new();
            row.insert("city".to_string(), Value::Text(format!("c{}", i)));
            let revenue = if i == 42 { 100_000.0 } else { (i % 9) as f64 };
            row.insert("revenue".to_string(), Value::Number(revenue));
            rows.push(row);
        }
        Cuboid {
            dimensions: vec!["city".to_string()],
            rows,
        }
    }

    #[test]
    fn test_description_is_the_extreme_row() {
        let cuboid = cuboid_with_outlier();
        let worker = OutlierWorker::default();
        let result = worker
            .score(&cuboid, &["city".to_string()], &["revenue".to_string()])
            .unwrap()
            .unwrap();
        let description = result.description.unwrap();
        assert_eq!(description["city"], Value::Text("c42".into()));
        assert_eq!(description["revenue"], Value::Number(100_000.0));
        assert!(result.significance > 0.5);
    }

    #[test]
    fn test_empty_cuboid_not_applicable() {
        let cuboid = Cuboid {
            dimensions: vec![],
            rows: vec![],
        };
        let worker = OutlierWorker::default();
        assert!(worker
            .score(&cuboid, &[], &["m".to_string()])
            .unwrap()
            .is_none());
    }
}
