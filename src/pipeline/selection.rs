//! Feature ranking by forest importance and top-K selection

use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

use super::forest::RandomForest;
use super::matrix::FeatureMatrix;
use super::target::class_labels;
use crate::config::ForestParams;

/// A feature and its normalised importance
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Fit a forest on every non-target column and rank features by importance,
/// highest first. Equal importances keep table order.
pub fn rank_features(
    df: &DataFrame,
    target: &str,
    params: &ForestParams,
) -> Result<Vec<FeatureImportance>> {
    let labels = class_labels(df, target)?;
    let x = FeatureMatrix::from_frame(df, target)?;
    let forest = RandomForest::fit(&x, &labels.y, labels.classes, params)?;

    let mut ranked: Vec<FeatureImportance> = forest
        .feature_names
        .iter()
        .zip(forest.feature_importances())
        .map(|(feature, &importance)| FeatureImportance {
            feature: feature.clone(),
            importance,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Ok(ranked)
}

/// Keep the `k` most important features plus the target (last).
///
/// When `k` exceeds the number of features all of them are kept.
pub fn select_top_features(
    df: &DataFrame,
    target: &str,
    k: usize,
    params: &ForestParams,
) -> Result<(DataFrame, Vec<FeatureImportance>)> {
    let ranked = rank_features(df, target, params)?;

    let mut keep: Vec<String> = ranked.iter().take(k).map(|f| f.feature.clone()).collect();
    info!("Top {} feature(s): {:?}", keep.len(), keep);
    keep.push(target.to_string());

    let selected = df.select(keep)?;
    Ok((selected, ranked))
}

/// Reorder and restrict `df` to exactly `columns`
pub fn align_columns(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    df.select(columns.iter().map(|c| c.as_str()))
        .with_context(|| format!("Table is missing one of the selected columns {:?}", columns))
}
