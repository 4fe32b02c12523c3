//! Scry Core Library
//!
//! Shared functionality for the Scry automated insight discovery tool:
//! - Dataset values and field classification
//! - Pairwise association graphs (Cramér's V, Pearson)
//! - Maximum-spanning-tree field clustering
//! - Lazily materialized aggregation cube
//! - Scoring worker ensemble (isolation forest, regression, KNN)
//! - The staged insight engine tying it all together

pub mod catalog;
pub mod cluster;
pub mod correlation;
pub mod cube;
pub mod dataset;
pub mod error;
pub mod insights;
pub mod ml;
pub mod stats;

pub use catalog::{AnalyticType, Field, FieldCatalog, SemanticType};
pub use cluster::FieldCluster;
pub use correlation::AssociationMatrix;
pub use cube::{AggregationCube, Aggregator, Cuboid, CuboidKey};
pub use dataset::{Row, Value};
pub use error::{Error, Result};
pub use insights::{
    EngineConfig, InsightEngine, InsightSpace, InsightWorker, Stage, ViewSpace, WorkerEnsemble,
    WorkerType,
};
