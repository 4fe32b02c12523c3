//! Insight Pipeline - Automated Insight Discovery
//!
//! The insight pipeline is a staged engine that proactively surfaces what is
//! interesting in a tabular dataset. Instead of waiting for an analyst to ask
//! the right group-by question, it enumerates candidate view-spaces from the
//! dataset's own correlation structure, aggregates each one, and scores the
//! result with an ensemble of independent workers.
//!
//! ## Core Scoring Workers
//!
//! - **General** - Entropy-based distribution skew (always runs)
//! - **Outlier** - Isolation-forest anomaly strength
//! - **Trend** - 1-D regression fit over an ordered dimension
//! - **Group** - Neighbor homogeneity across a held-out dimension
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scry_core::insights::{EngineConfig, InsightEngine};
//!
//! let mut engine = InsightEngine::new(rows);
//! let ranked = engine.run(&EngineConfig::default())?;
//! ```

pub mod engine;
pub mod ensemble;
pub mod group;
pub mod impurity;
pub mod outlier;
pub mod trend;
pub mod types;

pub use engine::{EngineConfig, InsightEngine, Stage};
pub use ensemble::{InsightWorker, WorkerEnsemble};
pub use group::GroupWorker;
pub use impurity::{space_impurity, ImpurityScore};
pub use outlier::OutlierWorker;
pub use trend::TrendWorker;
pub use types::{InsightSpace, ViewSpace, WorkerResult, WorkerType};
