//! Column value labelling and class extraction
//!
//! Categorical encoding, class balancing and the forest all need the values of
//! a column as comparable labels. Values are rendered as strings so that
//! string, integer, float and boolean columns are handled the same way.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Class labels of a target column, indexed `0..classes.len()`
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabels {
    /// Distinct values in sorted order; position is the class index
    pub classes: Vec<String>,
    /// Class index of every row
    pub y: Vec<usize>,
}

impl ClassLabels {
    /// Number of rows in each class, by class index
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &class in &self.y {
            counts[class] += 1;
        }
        counts
    }

    /// Map another column's labels onto these classes
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }
}

/// Extract class labels from the target column. Null targets are an error.
pub fn class_labels(df: &DataFrame, target: &str) -> Result<ClassLabels> {
    let target_col = df
        .column(target)
        .with_context(|| format!("Target column '{}' not found", target))?;

    if target_col.null_count() > 0 {
        anyhow::bail!(
            "Target column '{}' contains {} null value(s)",
            target,
            target_col.null_count()
        );
    }

    let values = column_to_string_vec(target_col)?;
    let classes = sorted_unique_labels(target_col.dtype(), values.iter().flatten());

    let lookup: HashMap<&str, usize> = classes
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let y = values
        .iter()
        .flatten()
        .map(|v| lookup[v.as_str()])
        .collect();

    Ok(ClassLabels { classes, y })
}

/// Distinct labels, ordered numerically for numeric columns and
/// lexicographically otherwise
pub fn sorted_unique_labels<'a>(
    dtype: &DataType,
    labels: impl Iterator<Item = &'a String>,
) -> Vec<String> {
    let mut unique: Vec<String> = labels.cloned().collect();
    if dtype.is_primitive_numeric() {
        unique.sort_by(|a, b| compare_numeric_labels(a, b));
    } else {
        unique.sort();
    }
    unique.dedup();
    unique
}

fn compare_numeric_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

/// Convert a column to a Vec of Option<String> for comparison
pub fn column_to_string_vec(col: &Column) -> Result<Vec<Option<String>>> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let cast = col.cast(&DataType::Int64)?;
            cast.i64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let cast = col.cast(&DataType::UInt64)?;
            cast.u64()?
                .into_iter()
                .map(|v| v.map(|n| n.to_string()))
                .collect()
        }
        DataType::Float32 | DataType::Float64 => {
            let cast = col.cast(&DataType::Float64)?;
            cast.f64()?
                .into_iter()
                .map(|v| v.map(|n| format!("{}", n)))
                .collect()
        }
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        _ => {
            let cast = col.cast(&DataType::String)?;
            cast.str()?
                .into_iter()
                .map(|v| v.map(|s| s.to_string()))
                .collect()
        }
    };

    Ok(values)
}
