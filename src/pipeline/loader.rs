//! CSV loading and saving for stage artifacts

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

/// Rows used for CSV schema inference
const INFER_SCHEMA_LENGTH: usize = 10_000;

/// Load a CSV artifact into memory
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    info!("Loading data from {}", path.display());

    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_LENGTH))
        .finish()
        .with_context(|| format!("Failed to load CSV file: {}", path.display()))?
        .collect()
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    info!(
        "Loaded {} rows and {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Write a table as CSV (header, no index column), replacing any existing file
pub fn save_dataset(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;

    info!("Saved {} rows to {}", df.height(), path.display());
    Ok(())
}

/// Column names as owned strings, in table order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}
