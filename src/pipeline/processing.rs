//! Data processing stage
//!
//! load -> clean -> encode -> de-skew -> balance -> select (train) -> align
//! (test) -> save. Any failure aborts the whole run.

use std::path::{Path, PathBuf};

use polars::prelude::*;
use tracing::{error, info, info_span, warn};

use super::balance::balance_classes;
use super::clean::clean_data;
use super::encode::{apply_label_encoders, fit_label_encoders, LabelEncoder};
use super::loader::{column_names, load_dataset, save_dataset};
use super::selection::{align_columns, select_top_features, FeatureImportance};
use super::skew::{apply_log1p, skewed_columns};
use crate::config::{ensure_dir, ArtifactPaths, EncodingStrategy, ProcessingConfig};
use crate::error::{Result, StageErrorKind, StageResultExt};

/// What a processing run produced
#[derive(Debug, Clone)]
pub struct ProcessingOutcome {
    pub train_shape: (usize, usize),
    pub test_shape: (usize, usize),
    pub selected_features: Vec<String>,
    pub importances: Vec<FeatureImportance>,
}

/// Turns the raw train/test split into model-ready tables
pub struct DataProcessor {
    train_path: PathBuf,
    test_path: PathBuf,
    processed_train_path: PathBuf,
    processed_test_path: PathBuf,
    config: ProcessingConfig,
}

impl DataProcessor {
    /// Prepare the stage, creating the processed directory if needed
    pub fn new(
        train_path: &Path,
        test_path: &Path,
        paths: &ArtifactPaths,
        config: &ProcessingConfig,
    ) -> Result<Self> {
        ensure_dir(&paths.processed_dir).stage(StageErrorKind::Save)?;
        Ok(Self {
            train_path: train_path.to_path_buf(),
            test_path: test_path.to_path_buf(),
            processed_train_path: paths.processed_train_file.clone(),
            processed_test_path: paths.processed_test_file.clone(),
            config: config.clone(),
        })
    }

    /// Clean, encode with `encoders` and correct skewness.
    ///
    /// With `encoders = None` a fresh encoder is fitted on this table. With
    /// `skewed = None` the columns to log-transform are chosen from this
    /// table's own skewness. Returns the table and the transformed columns.
    pub fn preprocess_data(
        &self,
        df: DataFrame,
        encoders: Option<&[LabelEncoder]>,
        skewed: Option<&[String]>,
    ) -> Result<(DataFrame, Vec<String>)> {
        info!("Starting preprocessing data");
        self.preprocess_inner(df, encoders, skewed)
            .inspect_err(|e| error!("Error in preprocessing data: {:#}", e))
            .stage(StageErrorKind::Preprocess)
    }

    fn preprocess_inner(
        &self,
        df: DataFrame,
        encoders: Option<&[LabelEncoder]>,
        skewed: Option<&[String]>,
    ) -> anyhow::Result<(DataFrame, Vec<String>)> {
        let df = clean_data(df, &self.config.drop_columns)?;

        info!("Encoding categorical columns");
        let fitted;
        let encoders = match encoders {
            Some(encoders) => encoders,
            None => {
                fitted = fit_label_encoders(&df, &self.config.categorical_columns)?;
                &fitted[..]
            }
        };
        let df = apply_label_encoders(df, encoders, self.config.unseen_labels)?;

        info!("Handling skewness");
        let skewed = match skewed {
            Some(columns) => columns.to_vec(),
            None => skewed_columns(
                &df,
                &self.config.numerical_columns,
                self.config.skewness_threshold,
            )?,
        };
        let df = apply_log1p(df, &skewed)?;
        Ok((df, skewed))
    }

    /// Fit label encoders on a cleaned copy of the training table
    pub fn fit_encoders(&self, train: &DataFrame) -> Result<Vec<LabelEncoder>> {
        clean_data(train.clone(), &self.config.drop_columns)
            .and_then(|df| fit_label_encoders(&df, &self.config.categorical_columns))
            .inspect_err(|e| error!("Error fitting label encoders: {:#}", e))
            .stage(StageErrorKind::Preprocess)
    }

    /// Oversample minority classes of the target column
    pub fn balance_data(&self, df: &DataFrame) -> Result<DataFrame> {
        info!("Balancing data");
        let balanced = balance_classes(df, &self.config.target_column, self.config.random_state)
            .inspect_err(|e| error!("Error in balancing data: {:#}", e))
            .stage(StageErrorKind::Balance)?;
        info!("Data balanced successfully");
        Ok(balanced)
    }

    /// Keep the configured number of most important features plus the target
    pub fn feature_selection(&self, df: &DataFrame) -> Result<(DataFrame, Vec<FeatureImportance>)> {
        info!("Starting feature selection");
        let selected = select_top_features(
            df,
            &self.config.target_column,
            self.config.number_of_features,
            &self.config.feature_selection,
        )
        .inspect_err(|e| error!("Error in feature selection step: {:#}", e))
        .stage(StageErrorKind::FeatureSelection)?;
        info!("Feature selection completed");
        Ok(selected)
    }

    /// Restrict the test table to the training table's selected columns
    pub fn align_test(&self, test: &DataFrame, train_columns: &[String]) -> Result<DataFrame> {
        align_columns(test, train_columns)
            .inspect_err(|e| error!("Error aligning test columns: {:#}", e))
            .stage(StageErrorKind::FeatureSelection)
    }

    /// Write a processed table, without an index column
    pub fn save_data(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        info!("Saving data in processed folder");
        save_dataset(df, path)
            .inspect_err(|e| error!("Error in saving data: {:#}", e))
            .stage(StageErrorKind::Save)?;
        info!("Saving data successfully");
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<DataFrame> {
        load_dataset(path)
            .inspect_err(|e| error!("Error loading data from {}: {:#}", path.display(), e))
            .stage(StageErrorKind::Load)
    }

    /// Run every processing step for both tables
    pub fn process(&self) -> Result<ProcessingOutcome> {
        let _span = info_span!("data_processing").entered();
        let result = self.process_inner();
        match &result {
            Ok(_) => info!("Data processing completed successfully"),
            Err(e) => error!("Error in preprocessing pipeline: {}", e),
        }
        result
    }

    fn process_inner(&self) -> Result<ProcessingOutcome> {
        info!("Loading the data from raw dir");
        let train = self.load(&self.train_path)?;
        let test = self.load(&self.test_path)?;

        let (train, test) = match self.config.encoding {
            EncodingStrategy::FitOnTrain => {
                let encoders = self.fit_encoders(&train)?;
                let (train, skewed) = self.preprocess_data(train, Some(&encoders), None)?;
                let (test, _) = self.preprocess_data(test, Some(&encoders), Some(&skewed))?;
                (train, test)
            }
            EncodingStrategy::Independent => {
                warn!(
                    "Preprocessing train and test independently; \
                     codes and log1p columns may differ between them"
                );
                let (train, _) = self.preprocess_data(train, None, None)?;
                let (test, _) = self.preprocess_data(test, None, None)?;
                (train, test)
            }
        };

        let train = self.balance_data(&train)?;
        let test = if self.config.balance_test {
            self.balance_data(&test)?
        } else {
            test
        };

        let (mut train, importances) = self.feature_selection(&train)?;
        let selected = column_names(&train);
        let mut test = self.align_test(&test, &selected)?;

        self.save_data(&mut train, &self.processed_train_path)?;
        self.save_data(&mut test, &self.processed_test_path)?;

        let selected_features = selected
            .into_iter()
            .filter(|c| c != &self.config.target_column)
            .collect();

        Ok(ProcessingOutcome {
            train_shape: train.shape(),
            test_shape: test.shape(),
            selected_features,
            importances,
        })
    }
}
