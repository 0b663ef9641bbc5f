//! Run summary report generation

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::model::TrainingReport;
use crate::pipeline::{FeatureImportance, IngestionOutcome, ProcessingOutcome};

/// Importances listed under the summary table
const TOP_IMPORTANCES: usize = 10;

/// Outcomes and timings of the stages that ran
#[derive(Debug, Default)]
pub struct RunSummary {
    pub ingestion: Option<(IngestionOutcome, Duration)>,
    pub processing: Option<(ProcessingOutcome, Duration)>,
    pub training: Option<(TrainingReport, Duration)>,
}

impl RunSummary {
    pub fn record_ingestion(&mut self, outcome: IngestionOutcome, elapsed: Duration) {
        self.ingestion = Some((outcome, elapsed));
    }

    pub fn record_processing(&mut self, outcome: ProcessingOutcome, elapsed: Duration) {
        self.processing = Some((outcome, elapsed));
    }

    pub fn record_training(&mut self, report: TrainingReport, elapsed: Duration) {
        self.training = Some((report, elapsed));
    }

    /// Total time across recorded stages
    pub fn total_elapsed(&self) -> Duration {
        self.ingestion.as_ref().map(|(_, d)| *d).unwrap_or_default()
            + self.processing.as_ref().map(|(_, d)| *d).unwrap_or_default()
            + self.training.as_ref().map(|(_, d)| *d).unwrap_or_default()
    }

    /// Stage | Result | Time
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Stage").add_attribute(Attribute::Bold),
            Cell::new("Result").add_attribute(Attribute::Bold),
            Cell::new("Time").add_attribute(Attribute::Bold),
        ]);

        if let Some((outcome, elapsed)) = &self.ingestion {
            table.add_row(vec![
                Cell::new("📥 Ingestion"),
                Cell::new(format!(
                    "{} bytes downloaded, {} train / {} test rows",
                    outcome.raw_bytes, outcome.train_rows, outcome.test_rows
                )),
                Cell::new(format_duration(*elapsed)),
            ]);
        }

        if let Some((outcome, elapsed)) = &self.processing {
            table.add_row(vec![
                Cell::new("🧹 Processing"),
                Cell::new(format!(
                    "train {} x {}, test {} x {}, {} feature(s) kept",
                    outcome.train_shape.0,
                    outcome.train_shape.1,
                    outcome.test_shape.0,
                    outcome.test_shape.1,
                    outcome.selected_features.len()
                )),
                Cell::new(format_duration(*elapsed)),
            ]);
        }

        if let Some((report, elapsed)) = &self.training {
            let accuracy = report.metrics.accuracy * 100.0;
            let color = if accuracy >= 80.0 {
                Color::Green
            } else if accuracy >= 60.0 {
                Color::Yellow
            } else {
                Color::Red
            };
            table.add_row(vec![
                Cell::new("🎯 Training"),
                Cell::new(format!(
                    "accuracy {:.1}%, precision {:.3}, recall {:.3}, f1 {:.3}",
                    accuracy,
                    report.metrics.precision,
                    report.metrics.recall,
                    report.metrics.f1_score
                ))
                .fg(color),
                Cell::new(format_duration(*elapsed)),
            ]);
        }

        table.add_row(vec![
            Cell::new("⏱️  Total").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(format_duration(self.total_elapsed())).add_attribute(Attribute::Bold),
        ]);
        table
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        // Indent the table
        for line in self.to_table().to_string().lines() {
            println!("    {}", line);
        }

        if let Some((outcome, _)) = &self.processing {
            display_importances(&outcome.importances, &outcome.selected_features);
        }

        if let Some((report, _)) = &self.training {
            println!();
            println!(
                "    {} Model saved to {}",
                style("💾").cyan(),
                style(report.model_path.display()).yellow()
            );
        }
    }
}

fn display_importances(importances: &[FeatureImportance], selected: &[String]) {
    if importances.is_empty() {
        return;
    }
    println!();
    println!(
        "    {} {}",
        style("📝").cyan(),
        style("FEATURE IMPORTANCE").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
    for item in importances.iter().take(TOP_IMPORTANCES) {
        let marker = if selected.contains(&item.feature) {
            style("•").green()
        } else {
            style("·").dim()
        };
        println!(
            "      {} {:<40} {:.4}",
            marker, item.feature, item.importance
        );
    }
}

/// `1.23s` below a minute, `2m 05s` above
pub fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        let whole = elapsed.as_secs();
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}
