//! Full discovery pipeline command

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use scry_core::{Aggregator, InsightEngine, InsightSpace};

use super::load_csv;

#[allow(clippy::too_many_arguments)]
pub fn cmd_analyze(
    file: &Path,
    dimensions: Option<&[String]>,
    measures: Option<&[String]>,
    max_dimensions: usize,
    max_measures: usize,
    threshold: f64,
    aggregators: &[String],
    top: usize,
    json: bool,
) -> Result<()> {
    let ops = parse_aggregators(aggregators)?;
    let rows = load_csv(file)?;
    let row_count = rows.len();

    let mut engine = InsightEngine::new(rows);
    if dimensions.is_some() || measures.is_some() {
        engine.classify_fields_with_split(
            dimensions.unwrap_or_default(),
            measures.unwrap_or_default(),
        )?;
    } else {
        engine.classify_fields()?;
    }
    engine.build_graphs()?;
    engine.cluster_fields(None, None, Some(threshold), Some(threshold))?;
    engine.enumerate_subspaces(max_dimensions, max_measures)?;
    engine.build_cube(ops)?;
    engine.extract_insights()?;
    let subspace_count = engine.subspaces().len();
    let ranked = engine.rank().context("Ranking failed")?;
    let shown = &ranked[..ranked.len().min(top)];

    if json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    println!();
    println!(
        "💡 Top {} insights of {} ({} rows, {} view-spaces scored)",
        shown.len(),
        file.display(),
        row_count,
        subspace_count
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:>4} {:>8} {:<8} {:>6} {:<32} {}",
        "#", "score", "worker", "sig", "dimensions", "measures"
    );
    for (i, insight) in shown.iter().enumerate() {
        println!(
            "   {:>4} {:>8} {:<8} {:>6.3} {:<32} {}",
            i + 1,
            format_score(insight),
            insight.worker,
            insight.significance,
            join_or_dataset(&insight.dimensions),
            insight.measures.join(", ")
        );
    }
    println!();
    Ok(())
}

fn parse_aggregators(pairs: &[String]) -> Result<HashMap<String, Aggregator>> {
    let mut ops = HashMap::new();
    for pair in pairs {
        let (measure, op) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid --agg '{}', expected measure=op", pair))?;
        let aggregator = Aggregator::from_str(op).map_err(|e| anyhow!(e))?;
        ops.insert(measure.to_string(), aggregator);
    }
    Ok(ops)
}

fn format_score(insight: &InsightSpace) -> String {
    if insight.score.is_finite() {
        format!("{:.4}", insight.score)
    } else {
        "inf".to_string()
    }
}

fn join_or_dataset(dimensions: &[String]) -> String {
    if dimensions.is_empty() {
        "(whole dataset)".to_string()
    } else {
        dimensions.join(", ")
    }
}
