//! Data ingestion stage: download the raw CSV, then split it into train/test

use tracing::{error, info, info_span};

use super::loader::{load_dataset, save_dataset};
use super::split::train_test_split;
use crate::config::{ensure_dir, ArtifactPaths, IngestionConfig, DEFAULT_RANDOM_STATE};
use crate::error::{Result, StageErrorKind, StageResultExt};
use crate::storage::{ObjectLocation, ObjectStore};

/// What an ingestion run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionOutcome {
    pub raw_bytes: u64,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// Pulls one object from storage and writes the train/test split artifacts
pub struct DataIngestion<'a> {
    config: IngestionConfig,
    paths: ArtifactPaths,
    store: &'a dyn ObjectStore,
    seed: u64,
}

impl<'a> DataIngestion<'a> {
    /// Prepare the stage, creating the raw directory if needed
    pub fn new(
        config: &IngestionConfig,
        paths: &ArtifactPaths,
        store: &'a dyn ObjectStore,
    ) -> Result<Self> {
        ensure_dir(&paths.raw_dir).stage(StageErrorKind::Download)?;
        info!("DataIngestion instance created");
        Ok(Self {
            config: config.clone(),
            paths: paths.clone(),
            store,
            seed: DEFAULT_RANDOM_STATE,
        })
    }

    /// Use a different shuffle seed for the split
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fetch the configured object to the raw file path, overwriting it
    pub fn download_data(&self) -> Result<u64> {
        let location = ObjectLocation::new(
            self.config.project_id.clone(),
            &self.config.bucket_name,
            &self.config.bucket_file_name,
        );

        match self.store.download(&location, &self.paths.raw_file) {
            Ok(bytes) => {
                info!(
                    "Data downloaded from bucket {} to {}",
                    self.config.bucket_name,
                    self.paths.raw_file.display()
                );
                Ok(bytes)
            }
            Err(e) => {
                error!("Error downloading data: {:#}", e);
                Err(e).stage(StageErrorKind::Download)
            }
        }
    }

    /// Split the raw file into the train and test artifacts
    pub fn split_data(&self) -> Result<(usize, usize)> {
        info!("Starting data split into train and test sets");
        match self.write_split() {
            Ok(counts) => {
                info!(
                    "Data split completed. Train data saved to {}, test data saved to {}",
                    self.paths.train_file.display(),
                    self.paths.test_file.display()
                );
                Ok(counts)
            }
            Err(e) => {
                error!("Error splitting data: {:#}", e);
                Err(e).stage(StageErrorKind::Split)
            }
        }
    }

    fn write_split(&self) -> anyhow::Result<(usize, usize)> {
        let data = load_dataset(&self.paths.raw_file)?;
        let (mut train, mut test) = train_test_split(&data, self.config.train_ratio, self.seed)?;
        save_dataset(&mut train, &self.paths.train_file)?;
        save_dataset(&mut test, &self.paths.test_file)?;
        Ok((train.height(), test.height()))
    }

    /// Download then split. A failed split leaves the downloaded raw file in place.
    pub fn run(&self) -> Result<IngestionOutcome> {
        let _span = info_span!("data_ingestion").entered();

        let result = self.download_data().and_then(|raw_bytes| {
            let (train_rows, test_rows) = self.split_data()?;
            Ok(IngestionOutcome {
                raw_bytes,
                train_rows,
                test_rows,
            })
        });

        match &result {
            Ok(_) => info!("Data ingestion process completed successfully"),
            Err(_) => error!("Error in data ingestion process"),
        }
        info!("DataIngestion run finished");
        result
    }
}
