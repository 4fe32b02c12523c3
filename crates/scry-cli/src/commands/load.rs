//! Shared CSV loading into the scry row model
//!
//! Every cell is parsed the same way: empty string becomes a null, a valid
//! float becomes a number, anything else stays text. Field typing happens
//! later, in classification, over the whole column.

use std::path::Path;

use anyhow::{Context, Result};
use scry_core::{Row, Value};

pub fn load_csv(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header row")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV record at line {}", line + 2))?;
        let mut row = Row::new();
        for (key, cell) in headers.iter().zip(record.iter()) {
            row.insert(key.clone(), parse_cell(cell));
        }
        rows.push(row);
    }
    Ok(rows)
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(trimmed.to_string()),
    }
}
