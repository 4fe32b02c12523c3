//! Group worker - neighbor homogeneity across a held-out dimension
//!
//! Applicable to views with at least two dimensions. The last dimension is
//! held out as the target; rows that sit close together over the measures
//! and the remaining dimensions should then agree on the target if a real
//! group effect exists.

use crate::cube::Cuboid;
use crate::error::Result;
use crate::insights::ensemble::InsightWorker;
use crate::insights::types::{WorkerResult, WorkerType};
use crate::ml::{group_homogeneity, DEFAULT_K};

pub struct GroupWorker {
    k: usize,
}

impl GroupWorker {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl Default for GroupWorker {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl InsightWorker for GroupWorker {
    fn name(&self) -> &str {
        WorkerType::Group.as_str()
    }

    fn score(
        &self,
        cuboid: &Cuboid,
        dimensions: &[String],
        measures: &[String],
    ) -> Result<Option<WorkerResult>> {
        let Some((held_out, features)) = dimensions.split_last() else {
            return Ok(None);
        };
        if features.is_empty() {
            return Ok(None);
        }

        let significance = group_homogeneity(
            &cuboid.rows,
            measures,
            features,
            std::slice::from_ref(held_out),
            self.k,
        );

        Ok(significance.map(|s| WorkerResult {
            significance: s.clamp(0.0, 1.0),
            description: None,
        }))
    }
}
