//! Pipeline driver: ingestion, then processing, then training

use std::fmt;
use std::time::Instant;

use tracing::{error, info, info_span};

use super::ingestion::DataIngestion;
use super::processing::DataProcessor;
use crate::config::{AppConfig, ArtifactPaths};
use crate::error::{PipelineError, Result};
use crate::model::ModelTrainer;
use crate::report::RunSummary;
use crate::storage::ObjectStore;

/// One step of the training pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingestion,
    Processing,
    Training,
}

impl Stage {
    /// Every stage, in execution order
    pub const ALL: [Stage; 3] = [Stage::Ingestion, Stage::Processing, Stage::Training];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "Data ingestion",
            Stage::Processing => "Data processing",
            Stage::Training => "Model training",
        };
        write!(f, "{}", name)
    }
}

/// Progress of one stage, reported to the `run_stages` observer
#[derive(Debug)]
pub enum StageEvent<'e> {
    Started,
    Finished,
    Failed(&'e PipelineError),
}

/// Runs stages against one configuration and artifact layout.
///
/// Stages hand off through files only. There is no rollback and no retry: the
/// first failing stage ends the run with its error.
pub struct TrainingPipeline<'a> {
    config: &'a AppConfig,
    paths: ArtifactPaths,
    store: &'a dyn ObjectStore,
    trainer: &'a dyn ModelTrainer,
}

impl<'a> TrainingPipeline<'a> {
    pub fn new(
        config: &'a AppConfig,
        paths: ArtifactPaths,
        store: &'a dyn ObjectStore,
        trainer: &'a dyn ModelTrainer,
    ) -> Self {
        Self {
            config,
            paths,
            store,
            trainer,
        }
    }

    /// Run a single stage and record its outcome in `summary`
    pub fn run_stage(&self, stage: Stage, summary: &mut RunSummary) -> Result<()> {
        let start = Instant::now();
        match stage {
            Stage::Ingestion => {
                let outcome =
                    DataIngestion::new(&self.config.data_ingestion, &self.paths, self.store)?.run()?;
                summary.record_ingestion(outcome, start.elapsed());
            }
            Stage::Processing => {
                let outcome = DataProcessor::new(
                    &self.paths.train_file,
                    &self.paths.test_file,
                    &self.paths,
                    &self.config.data_processing,
                )?
                .process()?;
                summary.record_processing(outcome, start.elapsed());
            }
            Stage::Training => {
                let report = self.trainer.train(
                    &self.paths.processed_train_file,
                    &self.paths.processed_test_file,
                    &self.paths.model_file,
                )?;
                summary.record_training(report, start.elapsed());
            }
        }
        Ok(())
    }

    /// Run `stages` in the given order, stopping at the first failure.
    ///
    /// `observer` sees each stage's position, the stage and its progress.
    pub fn run_stages(
        &self,
        stages: &[Stage],
        summary: &mut RunSummary,
        mut observer: impl FnMut(usize, Stage, StageEvent<'_>),
    ) -> Result<()> {
        for (step, &stage) in stages.iter().enumerate() {
            info!("{} started", stage);
            observer(step, stage, StageEvent::Started);
            if let Err(e) = self.run_stage(stage, summary) {
                error!("{} failed: {}", stage, e);
                observer(step, stage, StageEvent::Failed(&e));
                return Err(e);
            }
            info!("{} finished", stage);
            observer(step, stage, StageEvent::Finished);
        }
        Ok(())
    }

    /// Run the full pipeline
    pub fn run(&self) -> Result<RunSummary> {
        let _span = info_span!("training_pipeline").entered();
        let mut summary = RunSummary::default();
        self.run_stages(&Stage::ALL, &mut summary, |_, _, _| {})?;
        info!("Training pipeline completed");
        Ok(summary)
    }
}
