//! Aggregation cube - lazily built, memoized cuboids per dimension-set
//!
//! A cuboid is the aggregated row-set for one dimension-set: raw rows are
//! grouped by the value-tuple of those dimensions and each measure column
//! is reduced with its configured operator. Cuboids are built on first
//! request, cached for the lifetime of the cube, and only invalidated by
//! re-ingesting a dataset (which builds a fresh cube).
//!
//! Cache keys are structured ([`CuboidKey`]: the sorted dimension-key
//! vector), so distinct dimension-sets can never collide the way joined
//! strings can. Reads are concurrent; at most one builder runs per key.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Row, Value};
use crate::error::{Error, Result};

/// Reduction operator applied to a measure column within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregator {
    Sum,
    Mean,
    Max,
    Min,
}

impl Aggregator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregator::Sum => "sum",
            Aggregator::Mean => "mean",
            Aggregator::Max => "max",
            Aggregator::Min => "min",
        }
    }

    /// Reduce the observed (non-missing) values of one group.
    /// An empty group reduces to `None`, never to zero.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(match self {
            Aggregator::Sum => values.iter().sum(),
            Aggregator::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregator::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Aggregator::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
        })
    }
}

impl fmt::Display for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Aggregator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sum" => Ok(Aggregator::Sum),
            "mean" => Ok(Aggregator::Mean),
            "max" => Ok(Aggregator::Max),
            "min" => Ok(Aggregator::Min),
            _ => Err(format!("Unknown aggregator: {}", s)),
        }
    }
}

/// Structured cache key: the dimension-set, sorted and deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CuboidKey(Vec<String>);

impl CuboidKey {
    pub fn new(dimensions: &[String]) -> Self {
        let mut keys = dimensions.to_vec();
        keys.sort();
        keys.dedup();
        Self(keys)
    }

    pub fn dimensions(&self) -> &[String] {
        &self.0
    }

    /// The empty key addresses the whole-dataset (measure-only) cuboid.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Aggregated rows for one dimension-set.
#[derive(Debug, Clone)]
pub struct Cuboid {
    pub dimensions: Vec<String>,
    pub rows: Vec<Row>,
}

impl Cuboid {
    pub fn size(&self) -> usize {
        self.rows.len()
    }
}

/// Owns the base rows and the memoized cuboid cache. All other components
/// hold read-only `Arc<Cuboid>` views.
pub struct AggregationCube {
    rows: Arc<Vec<Row>>,
    dimensions: HashSet<String>,
    measures: Vec<String>,
    ops: HashMap<String, Aggregator>,
    cuboids: RwLock<HashMap<CuboidKey, Arc<Cuboid>>>,
}

impl AggregationCube {
    /// `ops` maps measure key to operator; measures without an entry
    /// aggregate with `sum`.
    pub fn new(
        rows: Arc<Vec<Row>>,
        dimensions: &[String],
        measures: &[String],
        ops: HashMap<String, Aggregator>,
    ) -> Self {
        Self {
            rows,
            dimensions: dimensions.iter().cloned().collect(),
            measures: measures.to_vec(),
            ops,
            cuboids: RwLock::new(HashMap::new()),
        }
    }

    /// Fetch the cuboid for `dimensions`, building it on first request.
    ///
    /// Requesting an unknown dimension key is a configuration error by the
    /// caller (the enumeration produced a field the dataset lacks) and is
    /// fatal rather than silently tolerated.
    pub fn get_cuboid(&self, dimensions: &[String]) -> Result<Arc<Cuboid>> {
        for key in dimensions {
            if !self.dimensions.contains(key) {
                return Err(Error::UnknownField(key.clone()));
            }
        }
        let key = CuboidKey::new(dimensions);

        if let Some(cuboid) = self.read_cache().get(&key) {
            return Ok(Arc::clone(cuboid));
        }

        // single writer: the write lock serializes builds, and the
        // double-check below keeps a lost race from rebuilding
        let mut cache = self.write_cache();
        if let Some(cuboid) = cache.get(&key) {
            return Ok(Arc::clone(cuboid));
        }
        let cuboid = Arc::new(self.build(&key));
        debug!(
            dimensions = ?key.dimensions(),
            groups = cuboid.size(),
            "cuboid materialized"
        );
        cache.insert(key, Arc::clone(&cuboid));
        Ok(cuboid)
    }

    /// Number of cuboids currently cached.
    pub fn cached_cuboids(&self) -> usize {
        self.read_cache().len()
    }

    fn build(&self, key: &CuboidKey) -> Cuboid {
        let dims = key.dimensions();
        // group index preserves first-seen order for deterministic output
        let mut group_index: HashMap<Vec<String>, usize> = HashMap::new();
        let mut groups: Vec<(Row, Vec<Vec<f64>>)> = Vec::new();

        for row in self.rows.iter() {
            let group_key: Vec<String> = dims
                .iter()
                .map(|d| row.get(d).map_or_else(|| Value::Null.label(), Value::label))
                .collect();
            let slot = *group_index.entry(group_key).or_insert_with(|| {
                let mut head: Row = Row::new();
                for d in dims {
                    head.insert(d.clone(), row.get(d).cloned().unwrap_or(Value::Null));
                }
                groups.push((head, vec![Vec::new(); self.measures.len()]));
                groups.len() - 1
            });
            for (m, measure) in self.measures.iter().enumerate() {
                // missing and non-numeric cells are excluded, not zeroed
                if let Some(v) = row.get(measure).and_then(Value::as_number) {
                    groups[slot].1[m].push(v);
                }
            }
        }

        let rows = groups
            .into_iter()
            .map(|(mut head, columns)| {
                for (m, measure) in self.measures.iter().enumerate() {
                    let op = self.ops.get(measure).copied().unwrap_or(Aggregator::Sum);
                    let aggregated = op.apply(&columns[m]).map_or(Value::Null, Value::Number);
                    head.insert(measure.clone(), aggregated);
                }
                head
            })
            .collect();

        Cuboid {
            dimensions: dims.to_vec(),
            rows,
        }
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, HashMap<CuboidKey, Arc<Cuboid>>> {
        match self.cuboids.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, HashMap<CuboidKey, Arc<Cuboid>>> {
        match self.cuboids.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
