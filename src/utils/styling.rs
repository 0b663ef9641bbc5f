//! Terminal styling utilities

use console::{style, Emoji};

use crate::config::{AppConfig, ArtifactPaths};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static BUCKET: Emoji<'_, '_> = Emoji("🪣 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static TARGET: Emoji<'_, '_> = Emoji("🎯 ", "");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[x] ");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("hotelcancel").cyan().bold(),
        style("Hotel booking cancellation training pipeline").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(config: &AppConfig, paths: &ArtifactPaths) {
    let ingestion = &config.data_ingestion;
    let processing = &config.data_processing;

    println!("    {}", style("⚙️  Configuration").cyan().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!(
        "      {}Source:    {}/{}",
        BUCKET, ingestion.bucket_name, ingestion.bucket_file_name
    );
    println!(
        "      {}Artifacts: {}",
        FOLDER,
        paths.raw_dir.parent().unwrap_or(&paths.raw_dir).display()
    );
    println!("      {}Target:    {}", TARGET, processing.target_column);
    println!(
        "      {}Split {} | skew threshold {} | top {} features",
        CHART,
        style(format!("{:.0}/{:.0}", ingestion.train_ratio * 100.0, (1.0 - ingestion.train_ratio) * 100.0)).yellow(),
        style(processing.skewness_threshold).yellow(),
        style(processing.number_of_features).yellow()
    );
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: usize, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a failure to stderr
pub fn print_failure(message: &str) {
    eprintln!("    {}{}", CROSS, style(message).red());
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Training pipeline complete!").green().bold()
    );
    println!();
}
