//! Field classification command

use std::path::Path;

use anyhow::{Context, Result};
use scry_core::InsightEngine;

use super::load_csv;

pub fn cmd_fields(
    file: &Path,
    dimensions: Option<&[String]>,
    measures: Option<&[String]>,
    json: bool,
) -> Result<()> {
    let rows = load_csv(file)?;
    let row_count = rows.len();
    let mut engine = InsightEngine::new(rows);
    if dimensions.is_some() || measures.is_some() {
        engine.classify_fields_with_split(
            dimensions.unwrap_or_default(),
            measures.unwrap_or_default(),
        )?;
    } else {
        engine.classify_fields().context("Field classification failed")?;
    }
    let catalog = engine.catalog();

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.fields())?);
        return Ok(());
    }

    println!();
    println!("🔍 Fields of {} ({} rows)", file.display(), row_count);
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:<24} {:<10} {:<13} {:>12}",
        "field", "analytic", "semantic", "cardinality"
    );
    for field in catalog.fields() {
        println!(
            "   {:<24} {:<10} {:<13} {:>12}",
            field.key,
            field.analytic_type.as_str(),
            field.semantic_type.as_str(),
            field.cardinality
        );
    }
    println!();
    println!(
        "   {} dimensions, {} measures",
        catalog.dimensions().len(),
        catalog.measures().len()
    );
    println!();
    Ok(())
}
