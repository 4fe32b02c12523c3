//! Integration tests for scry-core
//!
//! These tests exercise the full classify → graph → cluster → enumerate →
//! aggregate → score → rank pipeline on synthetic datasets.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use scry_core::insights::InsightEngine;
use scry_core::{AnalyticType, Row, Value};

/// 240 rows, 3 dimensions, 2 measures. `region` is a deterministic function
/// of `city` (Cramér's V = 1), `channel` cycles independently of both.
fn correlated_sales_rows() -> Vec<Row> {
    let cities = ["rome", "oslo", "lima", "kyiv", "bern", "oslo2"];
    (0..240)
        .map(|i| {
            let city = cities[i % 6];
            let region = if i % 6 < 3 { "south" } else { "north" };
            let channel = ["web", "store", "phone", "partner"][(i / 6) % 4];
            let mut row = Row::new();
            row.insert("city".to_string(), city.into());
            row.insert("region".to_string(), region.into());
            row.insert("channel".to_string(), channel.into());
            row.insert(
                "revenue".to_string(),
                Value::Number((i % 6) as f64 * 100.0 + (i % 11) as f64 + 0.5),
            );
            row.insert(
                "units".to_string(),
                Value::Number((i % 7) as f64 * 3.0 + 0.25),
            );
            row
        })
        .collect()
}

/// 10,000 rows, 4 independent random dimensions, 6 independent random
/// measures. No structure anywhere.
fn structureless_rows() -> Vec<Row> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..10_000)
        .map(|_| {
            let mut row = Row::new();
            for d in 0..4 {
                let category: u32 = rng.gen_range(0..8);
                row.insert(format!("dim_{}", d), format!("v{}", category).into());
            }
            for m in 0..6 {
                row.insert(
                    format!("mea_{}", m),
                    Value::Number(rng.gen::<f64>() * 100.0),
                );
            }
            row
        })
        .collect()
}

#[test]
fn test_correlated_dimensions_flow_through_the_pipeline() {
    let mut engine = InsightEngine::new(correlated_sales_rows());
    engine.classify_fields().unwrap();

    let catalog = engine.catalog();
    assert_eq!(
        catalog.field("city").unwrap().analytic_type,
        AnalyticType::Dimension
    );
    assert_eq!(
        catalog.field("revenue").unwrap().analytic_type,
        AnalyticType::Measure
    );

    engine.build_graphs().unwrap();
    // city determines region, so their association is maximal
    let graph = engine.dimension_graph().unwrap();
    let ci = graph.fields.iter().position(|f| f == "city").unwrap();
    let ri = graph.fields.iter().position(|f| f == "region").unwrap();
    assert!(graph.get(ci, ri) > 0.3, "got {}", graph.get(ci, ri));

    engine.cluster_fields(Some(2), None, None, None).unwrap();
    let together = engine
        .dimension_clusters()
        .iter()
        .any(|c| c.contains(&"city".to_string()) && c.contains(&"region".to_string()));
    assert!(together, "city and region must cluster together");

    engine.enumerate_subspaces(3, 2).unwrap();
    let pair_space = engine
        .subspaces()
        .iter()
        .find(|s| {
            s.dimensions.contains(&"city".to_string())
                && s.dimensions.contains(&"region".to_string())
        })
        .cloned()
        .expect("a subspace must cover the correlated pair");

    engine.build_cube(Default::default()).unwrap();
    engine.extract_insights().unwrap();
    let ranked = engine.rank().unwrap();

    let covered = ranked.iter().find(|i| {
        i.dimensions == pair_space.dimensions && i.measures == pair_space.measures
    });
    let insight = covered.expect("the correlated pair's view-space must be scored");
    assert!(insight.impurity.is_finite());
}

#[test]
fn test_ranked_output_is_ascending() {
    let mut engine = InsightEngine::new(correlated_sales_rows());
    engine.classify_fields().unwrap();
    engine.build_graphs().unwrap();
    engine.cluster_fields(None, None, None, None).unwrap();
    engine.enumerate_subspaces(2, 2).unwrap();
    engine.build_cube(Default::default()).unwrap();
    engine.extract_insights().unwrap();
    let ranked = engine.rank().unwrap();
    assert!(!ranked.is_empty());
    for pair in ranked.windows(2) {
        assert!(pair[0].score <= pair[1].score);
    }
}

#[test]
fn test_structureless_dataset_stays_unclustered_and_undominated() {
    let mut engine = InsightEngine::new(structureless_rows());
    engine.classify_fields().unwrap();
    assert_eq!(engine.catalog().dimensions().len(), 4);
    assert_eq!(engine.catalog().measures().len(), 6);

    engine.build_graphs().unwrap();
    // independent fields associate weakly, so a 0.3 floor must keep the
    // partition from collapsing into one cluster
    engine
        .cluster_fields(Some(1), Some(1), Some(0.3), Some(0.3))
        .unwrap();
    assert!(engine.dimension_clusters().len() > 1);
    assert!(engine.measure_clusters().len() > 1);

    engine.enumerate_subspaces(3, 3).unwrap();
    engine.build_cube(Default::default()).unwrap();
    engine.extract_insights().unwrap();
    let ranked = engine.rank().unwrap();
    assert!(!ranked.is_empty());

    // no injected signal: the top of the ranking should not be a single
    // runaway view-space
    let distinct_leaders: HashSet<(Vec<String>, Vec<String>)> = ranked
        .iter()
        .take(10)
        .map(|i| (i.dimensions.clone(), i.measures.clone()))
        .collect();
    assert!(distinct_leaders.len() > 1);
}
