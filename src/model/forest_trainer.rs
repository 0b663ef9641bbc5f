//! Random forest trainer with a JSON model artifact

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span};

use super::{ClassificationMetrics, ModelTrainer, TrainingReport};
use crate::config::{ensure_dir, ForestParams};
use crate::error::{Result, StageErrorKind, StageResultExt};
use crate::pipeline::forest::RandomForest;
use crate::pipeline::loader::load_dataset;
use crate::pipeline::matrix::FeatureMatrix;
use crate::pipeline::target::{class_labels, column_to_string_vec, ClassLabels};

/// Everything written to the model file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub target_column: String,
    pub trained_at: String,
    pub params: ForestParams,
    pub metrics: ClassificationMetrics,
    pub forest: RandomForest,
}

impl ModelArtifact {
    /// Read a model file written by [`ForestTrainer`]
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open model file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse model file: {}", path.display()))
    }
}

/// Default [`ModelTrainer`]: the in-crate random forest
#[derive(Debug, Clone)]
pub struct ForestTrainer {
    target_column: String,
    params: ForestParams,
}

impl ForestTrainer {
    pub fn new(target_column: impl Into<String>, params: ForestParams) -> Self {
        Self {
            target_column: target_column.into(),
            params,
        }
    }

    fn fit_and_evaluate(
        &self,
        train_path: &Path,
        test_path: &Path,
        model_path: &Path,
    ) -> anyhow::Result<TrainingReport> {
        let train = load_dataset(train_path)?;
        let test = load_dataset(test_path)?;

        let labels = class_labels(&train, &self.target_column)?;
        let x_train = FeatureMatrix::from_frame(&train, &self.target_column)?;
        let x_test = FeatureMatrix::from_frame(&test, &self.target_column)?;
        if x_test.names != x_train.names {
            anyhow::bail!(
                "Test features {:?} do not match train features {:?}",
                x_test.names,
                x_train.names
            );
        }

        info!(
            "Fitting forest of {} tree(s) on {} rows",
            self.params.n_estimators,
            x_train.n_rows()
        );
        let forest = RandomForest::fit(&x_train, &labels.y, labels.classes.clone(), &self.params)?;

        let y_test = self.test_classes(&test, &labels)?;
        let y_pred: Vec<usize> = (0..x_test.n_rows())
            .map(|row| forest.predict(&x_test.row(row)))
            .collect();
        let metrics = ClassificationMetrics::compute(&y_test, &y_pred, labels.classes.len());
        info!(
            "Evaluation on {} test rows: accuracy {:.4}, precision {:.4}, recall {:.4}, f1 {:.4}",
            y_test.len(),
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1_score
        );

        if let Some(dir) = model_path.parent() {
            ensure_dir(dir)?;
        }
        let artifact = ModelArtifact {
            target_column: self.target_column.clone(),
            trained_at: Local::now().to_rfc3339(),
            params: self.params.clone(),
            metrics: metrics.clone(),
            forest,
        };
        let file = File::create(model_path)
            .with_context(|| format!("Failed to create model file: {}", model_path.display()))?;
        serde_json::to_writer(BufWriter::new(file), &artifact)
            .with_context(|| format!("Failed to write model file: {}", model_path.display()))?;
        info!("Model saved to {}", model_path.display());

        Ok(TrainingReport {
            model_path: model_path.to_path_buf(),
            train_rows: x_train.n_rows(),
            test_rows: x_test.n_rows(),
            metrics,
        })
    }

    /// Map test target values onto the classes seen in training
    fn test_classes(&self, test: &DataFrame, labels: &ClassLabels) -> anyhow::Result<Vec<usize>> {
        let col = test
            .column(&self.target_column)
            .with_context(|| format!("Target column '{}' not found in test data", self.target_column))?;
        column_to_string_vec(col)?
            .into_iter()
            .map(|value| {
                let value = value.context("Test target contains null values")?;
                labels
                    .index_of(&value)
                    .with_context(|| format!("Test target class '{}' never seen in training", value))
            })
            .collect()
    }
}

impl ModelTrainer for ForestTrainer {
    fn train(&self, train_path: &Path, test_path: &Path, model_path: &Path) -> Result<TrainingReport> {
        let _span = info_span!("model_training").entered();
        self.fit_and_evaluate(train_path, test_path, model_path)
            .inspect_err(|e| error!("Error in model training: {:#}", e))
            .stage(StageErrorKind::Training)
    }
}
