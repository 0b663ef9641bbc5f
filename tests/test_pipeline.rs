//! Integration tests for the full training pipeline

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use hotelcancel::error::{PipelineError, StageErrorKind};
use hotelcancel::model::{ClassificationMetrics, ForestTrainer, ModelArtifact, ModelTrainer, TrainingReport};
use hotelcancel::pipeline::{DataIngestion, Stage, StageEvent, TrainingPipeline};
use hotelcancel::report::RunSummary;

#[path = "common/mod.rs"]
mod common;

use common::*;

/// Records the paths it was called with instead of fitting anything
#[derive(Default)]
struct RecordingTrainer {
    calls: RefCell<Vec<(PathBuf, PathBuf, PathBuf)>>,
}

impl ModelTrainer for RecordingTrainer {
    fn train(&self, train_path: &Path, test_path: &Path, model_path: &Path) -> hotelcancel::Result<TrainingReport> {
        assert!(train_path.exists(), "training started before processing wrote its output");
        assert!(test_path.exists());
        self.calls.borrow_mut().push((
            train_path.to_path_buf(),
            test_path.to_path_buf(),
            model_path.to_path_buf(),
        ));
        Ok(TrainingReport {
            model_path: model_path.to_path_buf(),
            train_rows: 0,
            test_rows: 0,
            metrics: ClassificationMetrics::compute(&[], &[], 2),
        })
    }
}

/// Always fails, like a trainer that cannot write its artifact
struct FailingTrainer;

impl ModelTrainer for FailingTrainer {
    fn train(&self, _: &Path, _: &Path, _: &Path) -> hotelcancel::Result<TrainingReport> {
        Err(PipelineError::stage(
            StageErrorKind::Training,
            anyhow::anyhow!("disk full"),
        ))
    }
}

#[test]
fn test_full_pipeline_trains_model() {
    let ws = Workspace::new(150);
    let config = test_config();
    let trainer = ForestTrainer::new("booking_status", config.model_training.clone());

    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &trainer);
    let summary = pipeline.run().unwrap();

    assert!(summary.ingestion.is_some());
    assert!(summary.processing.is_some());
    let (report, _) = summary.training.as_ref().unwrap();
    assert_eq!(report.model_path, ws.paths.model_file);
    assert!(
        report.metrics.accuracy > 0.7,
        "accuracy {} on a separable dataset",
        report.metrics.accuracy
    );

    let artifact = ModelArtifact::load(&ws.paths.model_file).unwrap();
    assert_eq!(artifact.forest.n_trees(), 15);
    assert_eq!(artifact.forest.feature_names.len(), 4);
}

#[test]
fn test_trainer_receives_processed_paths() {
    let ws = Workspace::new(90);
    let config = test_config();
    let trainer = RecordingTrainer::default();

    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &trainer);
    pipeline.run().unwrap();

    let calls = trainer.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        (
            ws.paths.processed_train_file.clone(),
            ws.paths.processed_test_file.clone(),
            ws.paths.model_file.clone(),
        )
    );
}

#[test]
fn test_ingestion_failure_halts_pipeline() {
    let ws = Workspace::new(60);
    let mut config = test_config();
    config.data_ingestion.bucket_name = "no-such-bucket".to_string();
    let trainer = RecordingTrainer::default();

    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &trainer);
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.stage_kind(), Some(StageErrorKind::Download));
    assert!(trainer.calls.borrow().is_empty());
    assert!(!ws.paths.processed_dir.exists());
}

#[test]
fn test_training_failure_is_pipeline_result() {
    let ws = Workspace::new(60);
    let config = test_config();

    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &FailingTrainer);
    let err = pipeline.run().unwrap_err();

    assert_eq!(err.stage_kind(), Some(StageErrorKind::Training));
    assert!(err.to_string().contains("disk full"));
    // Earlier stages keep their output
    assert!(ws.paths.processed_train_file.exists());
}

#[test]
fn test_single_stage_without_inputs_fails() {
    let ws = Workspace::new(30);
    let config = test_config();
    let trainer = RecordingTrainer::default();

    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &trainer);
    let mut summary = RunSummary::default();
    let err = pipeline
        .run_stages(&[Stage::Processing], &mut summary, |_, _, _| {})
        .unwrap_err();

    assert_eq!(err.stage_kind(), Some(StageErrorKind::Load));
    assert!(summary.processing.is_none());
}

#[test]
fn test_stages_can_run_one_at_a_time() {
    let ws = Workspace::new(90);
    let config = test_config();
    let trainer = ForestTrainer::new("booking_status", config.model_training.clone());
    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &trainer);

    let mut summary = RunSummary::default();
    for stage in Stage::ALL {
        pipeline.run_stage(stage, &mut summary).unwrap();
    }

    assert!(ws.paths.model_file.exists());
    assert!(summary.to_table().to_string().contains("Training"));
}

#[test]
fn test_stage_events_follow_execution_order() {
    let ws = Workspace::new(90);
    let config = test_config();
    let trainer = RecordingTrainer::default();
    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &trainer);

    let mut events = Vec::new();
    let mut summary = RunSummary::default();
    pipeline
        .run_stages(&Stage::ALL, &mut summary, |step, stage, event| {
            let tag = match event {
                StageEvent::Started => "started",
                StageEvent::Finished => "finished",
                StageEvent::Failed(_) => "failed",
            };
            events.push((step, stage, tag));
        })
        .unwrap();

    assert_eq!(
        events,
        vec![
            (0, Stage::Ingestion, "started"),
            (0, Stage::Ingestion, "finished"),
            (1, Stage::Processing, "started"),
            (1, Stage::Processing, "finished"),
            (2, Stage::Training, "started"),
            (2, Stage::Training, "finished"),
        ]
    );
}

#[test]
fn test_failed_stage_event_ends_run() {
    let ws = Workspace::new(60);
    let config = test_config();
    let pipeline = TrainingPipeline::new(&config, ws.paths.clone(), &ws.store, &FailingTrainer);

    let mut events = Vec::new();
    let mut summary = RunSummary::default();
    let err = pipeline
        .run_stages(
            &[Stage::Ingestion, Stage::Processing, Stage::Training, Stage::Ingestion],
            &mut summary,
            |step, stage, event| {
                if let StageEvent::Failed(e) = event {
                    events.push((step, stage, e.to_string()));
                }
            },
        )
        .unwrap_err();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, 2);
    assert_eq!(events[0].1, Stage::Training);
    assert_eq!(events[0].2, err.to_string());
}

#[test]
fn test_pipeline_split_matches_standalone_ingestion() {
    // The processing seed must not leak into the ingestion split
    let mut config = test_config();
    config.data_processing.random_state = 7;

    let piped = Workspace::new(80);
    let trainer = RecordingTrainer::default();
    let pipeline = TrainingPipeline::new(&config, piped.paths.clone(), &piped.store, &trainer);
    pipeline
        .run_stages(&[Stage::Ingestion], &mut RunSummary::default(), |_, _, _| {})
        .unwrap();

    let standalone = Workspace::new(80);
    DataIngestion::new(&config.data_ingestion, &standalone.paths, &standalone.store)
        .unwrap()
        .run()
        .unwrap();

    let piped_test = read_csv(&piped.paths.test_file);
    let standalone_test = read_csv(&standalone.paths.test_file);
    assert!(piped_test.equals(&standalone_test));
    assert!(read_csv(&piped.paths.train_file).equals(&read_csv(&standalone.paths.train_file)));
}
