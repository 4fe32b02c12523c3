//! General impurity scorer
//!
//! Always runs, outside the pluggable registry. Each measure column of a
//! cuboid is mapped to a probability distribution (positive shift +
//! normalization) and its Shannon entropy taken; the average across
//! measures is the view-space's shared `impurity`. The derived
//! `significance` is how far the distribution sits from uniform:
//! `1 - avg_entropy / avg_max_entropy`.

use crate::dataset::{numeric_column, Row};
use crate::stats::{entropy, linear_map_positive, max_entropy, normalize};

#[derive(Debug, Clone, Copy)]
pub struct ImpurityScore {
    /// Average per-measure entropy; lower = more structured.
    pub impurity: f64,
    /// Distribution skew in [0, 1]; higher = more interesting.
    pub significance: f64,
}

/// Score the aggregated rows of one view-space. `None` when no measure has
/// any numeric values to form a distribution from.
pub fn space_impurity(rows: &[Row], measures: &[String]) -> Option<ImpurityScore> {
    let mut entropy_sum = 0.0;
    let mut max_entropy_sum = 0.0;
    let mut counted = 0usize;

    for measure in measures {
        let values = numeric_column(rows, measure);
        if values.is_empty() {
            continue;
        }
        let distribution = normalize(&linear_map_positive(&values));
        entropy_sum += entropy(&distribution);
        max_entropy_sum += max_entropy(values.len());
        counted += 1;
    }

    if counted == 0 {
        return None;
    }

    let impurity = entropy_sum / counted as f64;
    let significance = if max_entropy_sum > 0.0 {
        (1.0 - entropy_sum / max_entropy_sum).clamp(0.0, 1.0)
    } else {
        // single-group cuboids carry no distribution at all
        0.0
    };

    Some(ImpurityScore {
        impurity,
        significance,
    })
}
