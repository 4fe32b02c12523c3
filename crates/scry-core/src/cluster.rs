//! Field clusterer - maximum-spanning-tree partitioning
//!
//! Treats an association matrix as a weighted complete graph and runs
//! Kruskal's algorithm over edges sorted by descending |weight|, merging
//! components via union-find. Unlike a classic spanning forest the stop
//! rule is the desired group count: merging halts as soon as the number of
//! disjoint components reaches `max_group_count`. An optional threshold
//! forbids merging through edges weaker than it, even if the target group
//! count has not been reached.

use tracing::debug;

use crate::correlation::AssociationMatrix;
use crate::error::{Error, Result};
use crate::stats::combinations;

/// A maximal group of mutually associated field keys.
pub type FieldCluster = Vec<String>;

struct UnionFind {
    parent: Vec<usize>,
    components: usize,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            components: n,
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            let root = self.find(self.parent[i]);
            self.parent[i] = root;
        }
        self.parent[i]
    }

    fn union(&mut self, a: usize, b: usize) -> bool {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return false;
        }
        self.parent[rb] = ra;
        self.components -= 1;
        true
    }
}

/// Partition the matrix's fields into at most `max_group_count` clusters.
///
/// `threshold`, when supplied, is the weakest |association| that may fuse
/// two components; weaker edges are skipped even if the partition still has
/// more components than requested.
pub fn cluster(
    matrix: &AssociationMatrix,
    max_group_count: usize,
    threshold: Option<f64>,
) -> Result<Vec<FieldCluster>> {
    if max_group_count == 0 {
        return Err(Error::InvalidConfig(
            "max_group_count must be at least 1".to_string(),
        ));
    }
    let n = matrix.size();
    // a measure-only (or dimension-only) dataset has an empty matrix on
    // the other side; its partition is empty, not an error
    if n == 0 {
        return Ok(Vec::new());
    }

    // complete graph edges by descending |weight|
    let mut edges: Vec<(usize, usize, f64)> = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            edges.push((i, j, matrix.get(i, j).abs()));
        }
    }
    edges.sort_by(|a, b| b.2.total_cmp(&a.2));

    let mut forest = UnionFind::new(n);
    for (i, j, weight) in edges {
        if forest.components <= max_group_count {
            break;
        }
        if let Some(t) = threshold {
            // sorted descending, so everything from here on is too weak
            if weight < t {
                break;
            }
        }
        forest.union(i, j);
    }

    // equivalence classes, members ordered as in the field list
    let mut classes: Vec<(usize, FieldCluster)> = Vec::new();
    for i in 0..n {
        let root = forest.find(i);
        match classes.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(matrix.fields[i].clone()),
            None => classes.push((root, vec![matrix.fields[i].clone()])),
        }
    }
    let clusters: Vec<FieldCluster> = classes.into_iter().map(|(_, members)| members).collect();
    debug!(
        fields = n,
        clusters = clusters.len(),
        max_group_count,
        "field clustering complete"
    );
    Ok(clusters)
}

/// Expand each cluster into every member combination with size in
/// `[min_size, max_size]`.
pub fn enumerate_subsets(
    clusters: &[FieldCluster],
    min_size: usize,
    max_size: usize,
) -> Vec<Vec<String>> {
    let mut subsets = Vec::new();
    for group in clusters {
        subsets.extend(combinations(group, min_size, max_size));
    }
    subsets
}
