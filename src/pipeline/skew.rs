//! Skewness detection and log(1 + x) correction

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

/// Sample skewness (adjusted Fisher-Pearson coefficient `G1`) of the values.
///
/// Returns `None` for fewer than three values and `0.0` for a constant column.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let count = n as f64;
    let mean = values.iter().sum::<f64>() / count;

    let (m2, m3) = values.iter().fold((0.0, 0.0), |(m2, m3), &v| {
        let d = v - mean;
        (m2 + d * d, m3 + d * d * d)
    });
    let m2 = m2 / count;
    let m3 = m3 / count;

    if m2 < 1e-14 {
        return Some(0.0);
    }

    let g1 = m3 / m2.powf(1.5);
    Some((count * (count - 1.0)).sqrt() / (count - 2.0) * g1)
}

/// Skewness of a numeric column, ignoring nulls
pub fn column_skewness(col: &Column) -> Result<Option<f64>> {
    let values = numeric_values(col)?;
    let present: Vec<f64> = values.into_iter().flatten().collect();
    Ok(skewness(&present))
}

fn numeric_values(col: &Column) -> Result<Vec<Option<f64>>> {
    if !col.dtype().is_primitive_numeric() {
        anyhow::bail!(
            "Numerical column '{}' has non-numeric type {}",
            col.name(),
            col.dtype()
        );
    }
    let cast = col.cast(&DataType::Float64)?;
    Ok(cast.f64()?.into_iter().collect())
}

/// Names of the configured numerical columns whose skewness exceeds `threshold`
pub fn skewed_columns(df: &DataFrame, columns: &[String], threshold: f64) -> Result<Vec<String>> {
    let mut skewed = Vec::new();

    for name in columns {
        let col = df
            .column(name)
            .with_context(|| format!("Numerical column '{}' not found", name))?;

        let skew = match column_skewness(col)? {
            Some(skew) => skew,
            None => continue,
        };
        if skew > threshold {
            info!(
                "Column '{}' skewness {:.3} exceeds {}",
                name, skew, threshold
            );
            skewed.push(name.clone());
        }
    }

    Ok(skewed)
}

/// Replace each listed column with `ln(1 + x)` of its values
pub fn apply_log1p(mut df: DataFrame, columns: &[String]) -> Result<DataFrame> {
    for name in columns {
        let col = df
            .column(name)
            .with_context(|| format!("Numerical column '{}' not found", name))?;
        let corrected: Vec<Option<f64>> = numeric_values(col)?
            .into_iter()
            .map(|v| v.map(f64::ln_1p))
            .collect();
        df.with_column(Series::new(name.as_str().into(), corrected))?;
        info!("Applied log1p to column '{}'", name);
    }
    Ok(df)
}

/// Apply `ln(1 + x)` to every configured numerical column whose skewness
/// exceeds `threshold`. Returns the table and the names of transformed columns.
pub fn correct_skewness(
    df: DataFrame,
    columns: &[String],
    threshold: f64,
) -> Result<(DataFrame, Vec<String>)> {
    let transformed = skewed_columns(&df, columns, threshold)?;
    let df = apply_log1p(df, &transformed)?;
    Ok((df, transformed))
}
