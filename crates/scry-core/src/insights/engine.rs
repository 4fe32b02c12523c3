//! Insight engine - the staged discovery pipeline
//!
//! Owns the dataset and drives it through classification, correlation,
//! clustering, subspace enumeration, aggregation, scoring, and ranking.
//! Each stage method checks that its predecessor ran and advances the
//! engine's [`Stage`] marker; calling stages out of order is a caller bug
//! and fails with [`Error::Stage`] instead of producing garbage.
//!
//! Re-running an earlier stage (e.g. after [`InsightEngine::set_dimensions`])
//! resets everything downstream of it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::FieldCatalog;
use crate::cluster::{cluster, enumerate_subsets, FieldCluster};
use crate::correlation::{build_dimension_graph, build_measure_graph, AssociationMatrix};
use crate::cube::{AggregationCube, Aggregator, CuboidKey};
use crate::dataset::Row;
use crate::error::{Error, Result};
use crate::insights::ensemble::WorkerEnsemble;
use crate::insights::impurity::space_impurity;
use crate::insights::types::{InsightSpace, ViewSpace, WorkerType};

/// Pipeline progress marker. Stages are ordered; each stage method
/// requires the previous stage to have completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    FieldsClassified,
    GraphsBuilt,
    Clustered,
    SubspacesEnumerated,
    CubeReady,
    Scored,
    Ranked,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::FieldsClassified => "fields_classified",
            Stage::GraphsBuilt => "graphs_built",
            Stage::Clustered => "clustered",
            Stage::SubspacesEnumerated => "subspaces_enumerated",
            Stage::CubeReady => "cube_ready",
            Stage::Scored => "scored",
            Stage::Ranked => "ranked",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tuning knobs for [`InsightEngine::run`]. Every knob has a usable
/// default; `..Default::default()` is the expected construction style.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Target dimension cluster count; defaults to `ceil(n / 3)`.
    pub dimension_groups: Option<usize>,
    /// Target measure cluster count; defaults to `ceil(n / 3)`.
    pub measure_groups: Option<usize>,
    /// Weakest association allowed to fuse two dimension clusters.
    pub dimension_threshold: f64,
    /// Weakest |correlation| allowed to fuse two measure clusters.
    pub measure_threshold: f64,
    /// Largest dimension-set enumerated per view-space.
    pub max_dimensions_in_view: usize,
    /// Largest measure-set enumerated per view-space.
    pub max_measures_in_view: usize,
    /// Per-measure reduction operators; unlisted measures sum.
    pub aggregators: HashMap<String, Aggregator>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dimension_groups: None,
            measure_groups: None,
            dimension_threshold: 0.3,
            measure_threshold: 0.3,
            max_dimensions_in_view: 3,
            max_measures_in_view: 3,
            aggregators: HashMap::new(),
        }
    }
}

fn default_group_count(field_count: usize) -> usize {
    field_count.div_ceil(3).max(1)
}

/// The discovery pipeline over one ingested dataset.
pub struct InsightEngine {
    rows: Arc<Vec<Row>>,
    catalog: FieldCatalog,
    dimension_graph: Option<AssociationMatrix>,
    measure_graph: Option<AssociationMatrix>,
    dimension_clusters: Vec<FieldCluster>,
    measure_clusters: Vec<FieldCluster>,
    subspaces: Vec<ViewSpace>,
    cube: Option<AggregationCube>,
    ensemble: WorkerEnsemble,
    insight_spaces: Vec<InsightSpace>,
    stage: Stage,
}

impl InsightEngine {
    /// Ingest `rows` with the standard worker ensemble.
    pub fn new(rows: Vec<Row>) -> Self {
        Self::with_ensemble(rows, WorkerEnsemble::standard())
    }

    /// Ingest `rows` with a caller-assembled worker ensemble.
    pub fn with_ensemble(rows: Vec<Row>, ensemble: WorkerEnsemble) -> Self {
        Self {
            rows: Arc::new(rows),
            catalog: FieldCatalog::default(),
            dimension_graph: None,
            measure_graph: None,
            dimension_clusters: Vec::new(),
            measure_clusters: Vec::new(),
            subspaces: Vec::new(),
            cube: None,
            ensemble,
            insight_spaces: Vec::new(),
            stage: Stage::Idle,
        }
    }

    pub fn ensemble_mut(&mut self) -> &mut WorkerEnsemble {
        &mut self.ensemble
    }

    /// Infer analytic and semantic types for every field in the dataset.
    pub fn classify_fields(&mut self) -> Result<()> {
        let keys = self.field_keys()?;
        self.catalog = FieldCatalog::classify(&self.rows, &keys);
        self.finish_classification()
    }

    /// Classify with a pre-known dimension/measure split overriding the
    /// inferred analytic types.
    pub fn classify_fields_with_split(
        &mut self,
        dimensions: &[String],
        measures: &[String],
    ) -> Result<()> {
        let keys = self.field_keys()?;
        self.catalog = FieldCatalog::classify_with_split(&self.rows, &keys, dimensions, measures);
        self.finish_classification()
    }

    fn field_keys(&self) -> Result<Vec<String>> {
        if self.rows.is_empty() {
            return Err(Error::EmptyDataset(
                "cannot classify fields of a dataset with no rows".to_string(),
            ));
        }
        let mut keys: Vec<String> = self
            .rows
            .iter()
            .flat_map(|row| row.keys().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn finish_classification(&mut self) -> Result<()> {
        info!(
            fields = self.catalog.fields().len(),
            dimensions = self.catalog.dimensions().len(),
            measures = self.catalog.measures().len(),
            "fields classified"
        );
        self.reset_to(Stage::FieldsClassified);
        Ok(())
    }

    /// Force exactly `keys` to be the dimensions; every other field
    /// becomes a measure. Resets all stages past classification.
    pub fn set_dimensions(&mut self, keys: &[String]) -> Result<()> {
        self.set_split(keys, crate::catalog::AnalyticType::Dimension)
    }

    /// Force exactly `keys` to be the measures; every other field becomes
    /// a dimension. Resets all stages past classification.
    pub fn set_measures(&mut self, keys: &[String]) -> Result<()> {
        self.set_split(keys, crate::catalog::AnalyticType::Measure)
    }

    fn set_split(&mut self, keys: &[String], chosen: crate::catalog::AnalyticType) -> Result<()> {
        use crate::catalog::AnalyticType;
        self.require(Stage::FieldsClassified)?;
        for key in keys {
            if !self.catalog.contains(key) {
                return Err(Error::UnknownField(key.clone()));
            }
        }
        let other = match chosen {
            AnalyticType::Dimension => AnalyticType::Measure,
            AnalyticType::Measure => AnalyticType::Dimension,
        };
        let all: Vec<String> = self.catalog.fields().iter().map(|f| f.key.clone()).collect();
        for key in &all {
            let analytic = if keys.contains(key) { chosen } else { other };
            self.catalog.override_analytic_type(key, analytic);
        }
        self.reset_to(Stage::FieldsClassified);
        Ok(())
    }

    /// Build the dimension (Cramér's V) and measure (Pearson) association
    /// matrices.
    pub fn build_graphs(&mut self) -> Result<()> {
        self.require(Stage::FieldsClassified)?;
        let dimensions = self.catalog.dimensions();
        let measures = self.catalog.measures();
        self.dimension_graph = Some(build_dimension_graph(&self.rows, &dimensions));
        self.measure_graph = Some(build_measure_graph(&self.rows, &measures));
        self.reset_to(Stage::GraphsBuilt);
        Ok(())
    }

    /// Partition both graphs into field clusters.
    ///
    /// Group counts default to `ceil(n / 3)` of the respective field count;
    /// thresholds of `None` permit arbitrarily weak merges.
    pub fn cluster_fields(
        &mut self,
        dimension_groups: Option<usize>,
        measure_groups: Option<usize>,
        dimension_threshold: Option<f64>,
        measure_threshold: Option<f64>,
    ) -> Result<()> {
        self.require(Stage::GraphsBuilt)?;
        let dimension_graph = self
            .dimension_graph
            .as_ref()
            .ok_or_else(|| missing_stage_state("dimension graph"))?;
        let measure_graph = self
            .measure_graph
            .as_ref()
            .ok_or_else(|| missing_stage_state("measure graph"))?;

        let dim_groups = dimension_groups.unwrap_or_else(|| default_group_count(dimension_graph.size()));
        let mea_groups = measure_groups.unwrap_or_else(|| default_group_count(measure_graph.size()));
        self.dimension_clusters = cluster(dimension_graph, dim_groups, dimension_threshold)?;
        self.measure_clusters = cluster(measure_graph, mea_groups, measure_threshold)?;
        self.reset_to(Stage::Clustered);
        Ok(())
    }

    /// Expand the clusters into candidate view-spaces: every in-cluster
    /// dimension subset crossed with every in-cluster measure subset.
    ///
    /// A dataset with no dimension fields still yields the whole-dataset
    /// view (an empty dimension-set); a dataset with no measures has
    /// nothing to score and is rejected.
    pub fn enumerate_subspaces(
        &mut self,
        max_dimensions_in_view: usize,
        max_measures_in_view: usize,
    ) -> Result<()> {
        self.require(Stage::Clustered)?;
        if max_dimensions_in_view == 0 || max_measures_in_view == 0 {
            return Err(Error::InvalidConfig(
                "view-space size limits must be at least 1".to_string(),
            ));
        }

        let mut dimension_sets =
            enumerate_subsets(&self.dimension_clusters, 1, max_dimensions_in_view);
        if dimension_sets.is_empty() {
            dimension_sets.push(Vec::new());
        }
        let measure_sets = enumerate_subsets(&self.measure_clusters, 1, max_measures_in_view);
        if measure_sets.is_empty() {
            return Err(Error::EmptyDataset(
                "dataset has no measure fields to aggregate".to_string(),
            ));
        }

        self.subspaces = dimension_sets
            .iter()
            .flat_map(|dims| {
                measure_sets.iter().map(|meas| ViewSpace {
                    dimensions: dims.clone(),
                    measures: meas.clone(),
                })
            })
            .collect();
        debug!(
            dimension_sets = dimension_sets.len(),
            measure_sets = measure_sets.len(),
            subspaces = self.subspaces.len(),
            "view-spaces enumerated"
        );
        self.reset_to(Stage::SubspacesEnumerated);
        Ok(())
    }

    /// Construct the aggregation cube and materialize the cuboid of every
    /// distinct dimension-set the enumeration produced.
    pub fn build_cube(&mut self, aggregators: HashMap<String, Aggregator>) -> Result<()> {
        self.require(Stage::SubspacesEnumerated)?;
        let cube = AggregationCube::new(
            Arc::clone(&self.rows),
            &self.catalog.dimensions(),
            &self.catalog.measures(),
            aggregators,
        );

        let distinct: HashSet<CuboidKey> = self
            .subspaces
            .iter()
            .map(|s| CuboidKey::new(&s.dimensions))
            .collect();
        for key in &distinct {
            cube.get_cuboid(key.dimensions())?;
        }
        debug!(cuboids = distinct.len(), "aggregation cube materialized");

        self.cube = Some(cube);
        self.reset_to(Stage::CubeReady);
        Ok(())
    }

    /// Score every view-space: the general impurity scorer first, then each
    /// enabled ensemble worker. View-spaces are independent and scored in
    /// parallel.
    ///
    /// A failing worker is logged and skipped; only cube access errors
    /// (unknown fields) abort the stage.
    pub fn extract_insights(&mut self) -> Result<()> {
        self.require(Stage::CubeReady)?;
        let cube = self
            .cube
            .as_ref()
            .ok_or_else(|| missing_stage_state("aggregation cube"))?;
        let ensemble = &self.ensemble;

        let scored: Vec<Vec<InsightSpace>> = self
            .subspaces
            .par_iter()
            .map(|space| score_space(cube, ensemble, space))
            .collect::<Result<_>>()?;

        self.insight_spaces = scored.into_iter().flatten().collect();
        info!(
            subspaces = self.subspaces.len(),
            insights = self.insight_spaces.len(),
            "scoring complete"
        );
        self.reset_to(Stage::Scored);
        Ok(())
    }

    /// Fill in `score = impurity / significance` and sort ascending, so the
    /// most interesting (structured and significant) insights come first.
    ///
    /// Zero or non-finite significance sinks the record to the end.
    pub fn rank(&mut self) -> Result<&[InsightSpace]> {
        self.require(Stage::Scored)?;
        for insight in &mut self.insight_spaces {
            let score = insight.impurity / insight.significance;
            insight.score = if insight.significance > 0.0 && score.is_finite() {
                score
            } else {
                f64::INFINITY
            };
        }
        self.insight_spaces
            .sort_by(|a, b| a.score.total_cmp(&b.score));
        self.stage = Stage::Ranked;
        Ok(&self.insight_spaces)
    }

    /// The whole pipeline in one call.
    pub fn run(&mut self, config: &EngineConfig) -> Result<&[InsightSpace]> {
        self.classify_fields()?;
        self.build_graphs()?;
        self.cluster_fields(
            config.dimension_groups,
            config.measure_groups,
            Some(config.dimension_threshold),
            Some(config.measure_threshold),
        )?;
        self.enumerate_subspaces(config.max_dimensions_in_view, config.max_measures_in_view)?;
        self.build_cube(config.aggregators.clone())?;
        self.extract_insights()?;
        self.rank()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn dimension_graph(&self) -> Option<&AssociationMatrix> {
        self.dimension_graph.as_ref()
    }

    pub fn measure_graph(&self) -> Option<&AssociationMatrix> {
        self.measure_graph.as_ref()
    }

    pub fn dimension_clusters(&self) -> &[FieldCluster] {
        &self.dimension_clusters
    }

    pub fn measure_clusters(&self) -> &[FieldCluster] {
        &self.measure_clusters
    }

    pub fn subspaces(&self) -> &[ViewSpace] {
        &self.subspaces
    }

    /// Scored (and, after [`InsightEngine::rank`], ordered) insights.
    pub fn insight_spaces(&self) -> &[InsightSpace] {
        &self.insight_spaces
    }

    fn require(&self, expected: Stage) -> Result<()> {
        if self.stage >= expected {
            Ok(())
        } else {
            Err(Error::Stage {
                expected: expected.as_str().to_string(),
                found: self.stage.as_str().to_string(),
            })
        }
    }

    /// Move to `stage`, discarding the state of every later stage.
    fn reset_to(&mut self, stage: Stage) {
        if stage < Stage::GraphsBuilt {
            self.dimension_graph = None;
            self.measure_graph = None;
        }
        if stage < Stage::Clustered {
            self.dimension_clusters.clear();
            self.measure_clusters.clear();
        }
        if stage < Stage::SubspacesEnumerated {
            self.subspaces.clear();
        }
        if stage < Stage::CubeReady {
            self.cube = None;
        }
        if stage < Stage::Scored {
            self.insight_spaces.clear();
        }
        self.stage = stage;
    }
}

fn score_space(
    cube: &AggregationCube,
    ensemble: &WorkerEnsemble,
    space: &ViewSpace,
) -> Result<Vec<InsightSpace>> {
    let cuboid = cube.get_cuboid(&space.dimensions)?;
    let Some(base) = space_impurity(&cuboid.rows, &space.measures) else {
        return Ok(Vec::new());
    };

    let mut insights = vec![InsightSpace {
        dimensions: space.dimensions.clone(),
        measures: space.measures.clone(),
        worker: WorkerType::General.as_str().to_string(),
        significance: base.significance,
        impurity: base.impurity,
        score: 0.0,
        description: None,
    }];

    for worker in ensemble.enabled_workers() {
        match worker.score(&cuboid, &space.dimensions, &space.measures) {
            Ok(Some(result)) => insights.push(InsightSpace {
                dimensions: space.dimensions.clone(),
                measures: space.measures.clone(),
                worker: worker.name().to_string(),
                significance: result.significance,
                impurity: base.impurity,
                score: 0.0,
                description: result.description,
            }),
            Ok(None) => {}
            Err(e) => warn!(
                worker = worker.name(),
                dimensions = ?space.dimensions,
                measures = ?space.measures,
                error = %e,
                "scoring worker failed; skipping"
            ),
        }
    }
    Ok(insights)
}

fn missing_stage_state(what: &str) -> Error {
    Error::Worker(format!("stage state missing: {}", what))
}
