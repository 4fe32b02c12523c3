//! Scoring worker ensemble
//!
//! A per-engine registry of independent scoring procedures. Each worker
//! consumes one aggregated cuboid and either produces a significance (with
//! optional description) or declares itself not applicable. The ensemble
//! is an explicit value owned by the engine instance, so two engines can
//! run concurrently with different worker configurations.

use crate::cube::Cuboid;
use crate::error::Result;
use crate::insights::group::GroupWorker;
use crate::insights::outlier::OutlierWorker;
use crate::insights::trend::TrendWorker;
use crate::insights::types::WorkerResult;

/// One scoring procedure. `Ok(None)` means "not applicable to this
/// view-space" and is not a failure; `Err` is recovered by the engine and
/// logged without aborting the run.
pub trait InsightWorker: Send + Sync {
    /// Stable identifier recorded on every insight this worker produces.
    fn name(&self) -> &str;

    fn score(
        &self,
        cuboid: &Cuboid,
        dimensions: &[String],
        measures: &[String],
    ) -> Result<Option<WorkerResult>>;
}

struct WorkerEntry {
    name: String,
    enabled: bool,
    worker: Box<dyn InsightWorker>,
}

/// Ordered collection of named, toggleable workers.
pub struct WorkerEnsemble {
    workers: Vec<WorkerEntry>,
}

impl Default for WorkerEnsemble {
    fn default() -> Self {
        Self::standard()
    }
}

impl WorkerEnsemble {
    /// No workers registered; only the general impurity scorer will run.
    pub fn empty() -> Self {
        Self {
            workers: Vec::new(),
        }
    }

    /// The built-in ensemble: outlier, trend, and group workers, enabled.
    pub fn standard() -> Self {
        let mut ensemble = Self::empty();
        ensemble.register(Box::new(OutlierWorker::default()));
        ensemble.register(Box::new(TrendWorker));
        ensemble.register(Box::new(GroupWorker::default()));
        ensemble
    }

    /// Append a worker. Re-registering a name replaces the old worker and
    /// keeps its position.
    pub fn register(&mut self, worker: Box<dyn InsightWorker>) {
        let name = worker.name().to_string();
        match self.workers.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.worker = worker,
            None => self.workers.push(WorkerEntry {
                name,
                enabled: true,
                worker,
            }),
        }
    }

    /// Toggle a worker by name. Returns false if no such worker exists.
    pub fn enable(&mut self, name: &str, enabled: bool) -> bool {
        match self.workers.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enabled workers in registration order.
    pub fn enabled_workers(&self) -> impl Iterator<Item = &dyn InsightWorker> {
        self.workers
            .iter()
            .filter(|e| e.enabled)
            .map(|e| e.worker.as_ref())
    }

    /// All registered worker names with their enabled flag.
    pub fn names(&self) -> Vec<(String, bool)> {
        self.workers
            .iter()
            .map(|e| (e.name.clone(), e.enabled))
            .collect()
    }
}
