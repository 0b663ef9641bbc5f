//! hotelcancel: training pipeline CLI
//!
//! Runs the whole pipeline, or a single stage, against `config/config.yaml`
//! in the working directory.

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use tracing::error;

use hotelcancel::cli::Cli;
use hotelcancel::config::{AppConfig, ArtifactPaths, CONFIG_PATH, LOG_DIR};
use hotelcancel::model::ForestTrainer;
use hotelcancel::pipeline::{StageEvent, TrainingPipeline};
use hotelcancel::report::{format_duration, RunSummary};
use hotelcancel::storage::store_from_env;
use hotelcancel::utils::{
    create_spinner, finish_with_error, finish_with_success, print_banner, print_completion,
    print_config, print_failure, print_info, print_step_header, print_success, LogContext,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = LogContext::init(Path::new(LOG_DIR))?;

    print_banner(env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::load(Path::new(CONFIG_PATH)) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            print_failure(&e.to_string());
            return Err(e.into());
        }
    };

    let paths = ArtifactPaths::default();
    print_config(&config, &paths);

    let store = store_from_env()?;
    let trainer = ForestTrainer::new(
        config.data_processing.target_column.clone(),
        config.model_training.clone(),
    );
    let pipeline = TrainingPipeline::new(&config, paths, store.as_ref(), &trainer);

    let mut summary = RunSummary::default();
    let mut spinner: Option<ProgressBar> = None;
    pipeline.run_stages(&cli.stages(), &mut summary, |step, stage, event| match event {
        StageEvent::Started => {
            print_step_header(step + 1, &stage.to_string());
            spinner = Some(create_spinner(&format!("{}...", stage)));
        }
        StageEvent::Finished => {
            if let Some(pb) = spinner.take() {
                finish_with_success(&pb, &format!("{} complete", stage));
            }
        }
        StageEvent::Failed(e) => {
            if let Some(pb) = spinner.take() {
                finish_with_error(&pb, &format!("{} failed", stage));
            }
            print_failure(&e.to_string());
        }
    })?;

    summary.display();
    print_success(&format!(
        "Finished in {}",
        format_duration(summary.total_elapsed())
    ));
    print_info(&format!("Log written to {}", log.log_file().display()));
    print_completion();
    Ok(())
}
