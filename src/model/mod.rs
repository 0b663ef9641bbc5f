//! Model training collaborator invoked by the pipeline's last stage

mod forest_trainer;
mod metrics;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use forest_trainer::*;
pub use metrics::*;

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub model_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics: ClassificationMetrics,
}

/// Fits a model on the processed train table, evaluates it on the processed
/// test table and persists it to `model_path`.
///
/// Failures are reported as training-stage errors.
pub trait ModelTrainer {
    fn train(&self, train_path: &Path, test_path: &Path, model_path: &Path) -> Result<TrainingReport>;
}
