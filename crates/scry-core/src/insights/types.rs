//! Core types for the insight pipeline

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dataset::Value;

/// Built-in scoring worker identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerType {
    /// Entropy-based distribution skew (always run)
    General,
    /// Isolation-forest anomaly strength
    Outlier,
    /// 1-D regression trend fit
    Trend,
    /// Neighbor-homogeneity group effect
    Group,
}

impl WorkerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerType::General => "general",
            WorkerType::Outlier => "outlier",
            WorkerType::Trend => "trend",
            WorkerType::Group => "group",
        }
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(WorkerType::General),
            "outlier" => Ok(WorkerType::Outlier),
            "trend" => Ok(WorkerType::Trend),
            "group" => Ok(WorkerType::Group),
            _ => Err(format!("Unknown worker type: {}", s)),
        }
    }
}

/// A candidate (dimension-set, measure-set) pair awaiting scoring.
/// Dimensions may be empty (whole-dataset measure view); measures never are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSpace {
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
}

/// What a single scoring worker says about one view-space.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerResult {
    /// Normalized so that higher = more interesting, in [0, 1].
    pub significance: f64,
    /// Optional payload, e.g. the extreme row for an outlier insight.
    pub description: Option<BTreeMap<String, Value>>,
}

/// A scored view-space produced by one worker.
///
/// `impurity` is shared across all workers for the same view-space
/// (computed once, attached to each record); `score` is filled in by the
/// ranking stage and is re-derivable as `impurity / significance`.
#[derive(Debug, Clone, Serialize)]
pub struct InsightSpace {
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    pub worker: String,
    pub significance: f64,
    pub impurity: f64,
    pub score: f64,
    pub description: Option<BTreeMap<String, Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_type_round_trip() {
        for w in [
            WorkerType::General,
            WorkerType::Outlier,
            WorkerType::Trend,
            WorkerType::Group,
        ] {
            assert_eq!(WorkerType::from_str(w.as_str()).unwrap(), w);
        }
        assert!(WorkerType::from_str("nope").is_err());
    }
}
