//! Removal of extraneous columns and duplicate rows

use anyhow::Result;
use polars::prelude::*;
use tracing::info;

/// Drop the given columns, then drop exact duplicate rows keeping the first.
///
/// Every listed column must be present.
pub fn clean_data(df: DataFrame, drop_columns: &[String]) -> Result<DataFrame> {
    let present: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    let absent: Vec<&String> = drop_columns.iter().filter(|c| !present.contains(c)).collect();
    if !absent.is_empty() {
        anyhow::bail!(
            "Expected column(s) {:?} not found. Available columns: {:?}",
            absent,
            present
        );
    }

    info!("Dropping columns {:?}", drop_columns);
    let df = df.drop_many(drop_columns.iter().map(|c| c.as_str()));

    let before = df.height();
    let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let removed = before - df.height();
    if removed > 0 {
        info!("Dropped {} duplicate row(s)", removed);
    }

    Ok(df)
}
