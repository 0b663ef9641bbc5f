//! Dense numeric view of the feature columns of a table

use anyhow::{Context, Result};
use polars::prelude::*;

/// Feature columns cast to `f64`, stored column-major
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub names: Vec<String>,
    pub dtypes: Vec<DataType>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Every column except `target`. Features must be numeric and null-free;
    /// categorical columns have to be encoded first.
    pub fn from_frame(df: &DataFrame, target: &str) -> Result<Self> {
        let mut names = Vec::new();
        let mut dtypes = Vec::new();
        let mut columns = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            if name == target {
                continue;
            }
            if !col.dtype().is_primitive_numeric() && col.dtype() != &DataType::Boolean {
                anyhow::bail!(
                    "Feature column '{}' has non-numeric type {}; encode it before this step",
                    name,
                    col.dtype()
                );
            }
            if col.null_count() > 0 {
                anyhow::bail!(
                    "Feature column '{}' contains {} null value(s)",
                    name,
                    col.null_count()
                );
            }

            let float_col = col
                .cast(&DataType::Float64)
                .with_context(|| format!("Failed to cast column '{}' to Float64", name))?;
            let values: Vec<f64> = float_col.f64()?.into_no_null_iter().collect();

            dtypes.push(col.dtype().clone());
            names.push(name);
            columns.push(values);
        }

        Ok(Self {
            names,
            dtypes,
            columns,
            n_rows: df.height(),
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.columns[feature][row]
    }

    pub fn column(&self, feature: usize) -> &[f64] {
        &self.columns[feature]
    }

    pub fn row(&self, row: usize) -> Vec<f64> {
        self.columns.iter().map(|c| c[row]).collect()
    }

    /// Squared Euclidean distance between two rows
    pub fn squared_distance(&self, a: usize, b: usize) -> f64 {
        self.columns
            .iter()
            .map(|c| {
                let d = c[a] - c[b];
                d * d
            })
            .sum()
    }
}
