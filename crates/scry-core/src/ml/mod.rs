//! Statistical learning primitives used by the scoring workers

pub mod isolation_forest;
pub mod knn;

pub use isolation_forest::IsolationForest;
pub use knn::{group_homogeneity, DEFAULT_K};
