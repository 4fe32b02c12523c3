//! Isolation forest outlier primitive
//!
//! Builds randomized partition trees over a bootstrap subsample and scores
//! each row by its average isolation depth: rows that separate from the
//! rest in few random splits are anomalous. Dimensions participate through
//! a learned category -> integer coding; measures are split on their raw
//! numeric values.
//!
//! Trees are arenas (node vector + index child pointers), so tree height
//! never turns into call-stack depth at scoring time.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

use crate::dataset::{Row, Value};

/// Euler-Mascheroni constant, for the harmonic-number approximation in
/// the path-length correction.
const EULER_GAMMA: f64 = 0.577_215_664_9;

const DEFAULT_TREE_COUNT: usize = 100;
const DEFAULT_SAMPLE_SIZE: usize = 256;
const SMALL_DATA_TREE_COUNT: usize = 20;

enum Node {
    Split {
        feature: usize,
        split: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        size: usize,
    },
}

struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

pub struct IsolationForest {
    /// Row-major encoded feature matrix. Missing measures encode as NaN,
    /// which always falls to the right branch (matching `x < split`).
    data: Vec<Vec<f64>>,
    tree_count: usize,
    sample_size: usize,
    height_limit: usize,
    trees: Vec<Tree>,
    rng: StdRng,
}

impl IsolationForest {
    /// Encode `rows` over the given dimensions and measures. The seed makes
    /// forests reproducible across runs.
    pub fn new(rows: &[Row], dimensions: &[String], measures: &[String], seed: u64) -> Self {
        let data = encode(rows, dimensions, measures);
        let n = data.len();
        // Psi is capped at the dataset size; small data only shrinks the
        // tree count, never the subsample, so every row (outliers
        // included) appears in every tree
        let (tree_count, sample_size) = if n < DEFAULT_SAMPLE_SIZE {
            (SMALL_DATA_TREE_COUNT, n.max(2))
        } else {
            (DEFAULT_TREE_COUNT, DEFAULT_SAMPLE_SIZE)
        };
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        Self {
            data,
            tree_count,
            sample_size,
            height_limit,
            trees: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Grow all trees over fresh subsamples.
    pub fn fit(&mut self) {
        self.trees.clear();
        if self.data.is_empty() {
            return;
        }
        let n = self.data.len();
        let amount = self.sample_size.min(n);
        for _ in 0..self.tree_count {
            let indices: Vec<usize> = sample(&mut self.rng, n, amount).into_vec();
            let mut nodes = Vec::new();
            let data = &self.data;
            let height_limit = self.height_limit;
            let root = grow(data, &mut nodes, &indices, 0, height_limit, &mut self.rng);
            self.trees.push(Tree { nodes, root });
        }
    }

    /// Anomaly score per row, in (0, 1): higher means more anomalous,
    /// around 0.5 means unremarkable.
    pub fn score_all(&self) -> Vec<f64> {
        let normalizer = average_path_length(self.sample_size);
        self.data
            .iter()
            .map(|record| {
                if self.trees.is_empty() || normalizer == 0.0 {
                    return 0.5;
                }
                let total: f64 = self
                    .trees
                    .iter()
                    .map(|tree| path_length(tree, record))
                    .sum();
                let avg = total / self.trees.len() as f64;
                2f64.powf(-(avg / normalizer))
            })
            .collect()
    }
}

fn grow(
    data: &[Vec<f64>],
    nodes: &mut Vec<Node>,
    indices: &[usize],
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> usize {
    if depth >= height_limit || indices.len() <= 1 {
        nodes.push(Node::Leaf {
            size: indices.len(),
        });
        return nodes.len() - 1;
    }

    let feature_count = data[indices[0]].len();
    // features with an actual spread in this subsample
    let splittable: Vec<(usize, f64, f64)> = (0..feature_count)
        .filter_map(|f| {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for &i in indices {
                let v = data[i][f];
                if v.is_finite() {
                    min = min.min(v);
                    max = max.max(v);
                }
            }
            (min < max).then_some((f, min, max))
        })
        .collect();
    if splittable.is_empty() {
        nodes.push(Node::Leaf {
            size: indices.len(),
        });
        return nodes.len() - 1;
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let split = rng.gen_range(min..max);

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| data[i][feature] < split);
    // a degenerate split isolates nothing; terminate instead of recursing
    if left_idx.is_empty() || right_idx.is_empty() {
        nodes.push(Node::Leaf {
            size: indices.len(),
        });
        return nodes.len() - 1;
    }

    let left = grow(data, nodes, &left_idx, depth + 1, height_limit, rng);
    let right = grow(data, nodes, &right_idx, depth + 1, height_limit, rng);
    nodes.push(Node::Split {
        feature,
        split,
        left,
        right,
    });
    nodes.len() - 1
}

fn path_length(tree: &Tree, record: &[f64]) -> f64 {
    let mut depth = 0.0;
    let mut current = tree.root;
    loop {
        match &tree.nodes[current] {
            Node::Leaf { size } => return depth + average_path_length(*size),
            Node::Split {
                feature,
                split,
                left,
                right,
            } => {
                current = if record[*feature] < *split { *left } else { *right };
                depth += 1.0;
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` nodes
/// (Preiss, 1999). Used both as leaf tail correction and score normalizer.
fn average_path_length(n: usize) -> f64 {
    if n > 2 {
        let n = n as f64;
        2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
    } else if n == 2 {
        1.0
    } else {
        0.0
    }
}

/// Row-major feature encoding: measures keep their numeric value (NaN when
/// missing), dimensions map each label to its first-seen index.
fn encode(rows: &[Row], dimensions: &[String], measures: &[String]) -> Vec<Vec<f64>> {
    let mut codings: Vec<std::collections::HashMap<String, usize>> =
        vec![std::collections::HashMap::new(); dimensions.len()];
    for row in rows {
        for (d, dim) in dimensions.iter().enumerate() {
            let label = row.get(dim).map_or_else(|| Value::Null.label(), Value::label);
            let next = codings[d].len();
            codings[d].entry(label).or_insert(next);
        }
    }
    rows.iter()
        .map(|row| {
            let mut features = Vec::with_capacity(dimensions.len() + measures.len());
            for (d, dim) in dimensions.iter().enumerate() {
                let label = row.get(dim).map_or_else(|| Value::Null.label(), Value::label);
                features.push(codings[d][&label] as f64);
            }
            for measure in measures {
                features.push(
                    row.get(measure)
                        .and_then(Value::as_number)
                        .unwrap_or(f64::NAN),
                );
            }
            features
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measure_rows(values: &[f64]) -> Vec<Row> {
        values
            .iter()
            .map(|&v| {
                let mut row = Row::new();
                row.insert("m".to_string(), Value::Number(v));
                row
            })
            .collect()
    }

    #[test]
    fn test_planted_outlier_dominates() {
        let mut values = vec![0.0; 99];
        // jitter so the field is splittable
        for (i, v) in values.iter_mut().enumerate() {
            *v = (i % 7) as f64 * 0.01;
        }
        values.push(1000.0);
        let rows = measure_rows(&values);
        let mut forest =
            IsolationForest::new(&rows, &[], &["m".to_string()], 7);
        forest.fit();
        let scores = forest.score_all();

        let outlier_score = scores[99];
        let max_inlier = scores[..99].iter().cloned().fold(0.0, f64::max);
        assert!(
            outlier_score > max_inlier + 0.1,
            "outlier {} should clear inliers {} by a wide margin",
            outlier_score,
            max_inlier
        );
        assert!(scores.iter().all(|&s| s > 0.0 && s < 1.0));
    }

    #[test]
    fn test_scores_reproducible_for_same_seed() {
        let values: Vec<f64> = (0..300).map(|i| (i % 17) as f64).collect();
        let rows = measure_rows(&values);
        let mut a = IsolationForest::new(&rows, &[], &["m".to_string()], 11);
        let mut b = IsolationForest::new(&rows, &[], &["m".to_string()], 11);
        a.fit();
        b.fit();
        assert_eq!(a.score_all(), b.score_all());
    }

    #[test]
    fn test_small_dataset_shrinks_forest() {
        let rows = measure_rows(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let mut forest = IsolationForest::new(&rows, &[], &["m".to_string()], 3);
        forest.fit();
        assert_eq!(forest.trees.len(), SMALL_DATA_TREE_COUNT);
        // the subsample never shrinks below the dataset itself
        assert_eq!(forest.sample_size, 10);
        let scores = forest.score_all();
        assert_eq!(scores.len(), 10);
        assert!(scores.iter().all(|&s| s > 0.0 && s < 1.0));
    }

    #[test]
    fn test_dimension_coding_participates() {
        let mut rows: Vec<Row> = Vec::new();
        for i in 0..200 {
            let mut row = Row::new();
            row.insert(
                "d".to_string(),
                Value::Text(if i == 0 { "rare".into() } else { format!("c{}", i % 3) }),
            );
            row.insert("m".to_string(), Value::Number((i % 5) as f64));
            rows.push(row);
        }
        let mut forest =
            IsolationForest::new(&rows, &["d".to_string()], &["m".to_string()], 5);
        forest.fit();
        let scores = forest.score_all();
        assert_eq!(scores.len(), 200);
        assert!(scores.iter().all(|&s| s.is_finite()));
    }
}
