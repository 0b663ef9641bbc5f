//! Log sink setup: one plain-text file per calendar day plus stderr

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ensure_dir;

const SEPARATOR_WIDTH: usize = 40;

/// Logging state for the lifetime of the process.
///
/// Dropping the context flushes buffered file output, so `main` keeps it alive
/// until every stage has finished.
pub struct LogContext {
    log_file: PathBuf,
    _guard: WorkerGuard,
}

impl LogContext {
    /// Open today's log file under `log_dir`, mark the start of a new session
    /// and route `tracing` events to it.
    ///
    /// If a global subscriber is already installed (tests, repeated calls) the
    /// separator is still written and the existing subscriber is kept.
    pub fn init(log_dir: &Path) -> Result<Self> {
        ensure_dir(log_dir)?;

        let now = Local::now();
        let log_file = log_dir.join(log_file_name(&now));
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;
        write_separator(&mut file, &now)
            .with_context(|| format!("Failed to write to log file: {}", log_file.display()))?;

        let (writer, guard) = tracing_appender::non_blocking(file);

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .with_filter(LevelFilter::INFO);

        let stderr_layer = fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            );

        // A second install fails harmlessly; the first subscriber stays active.
        let _ = tracing_subscriber::registry()
            .with(file_layer)
            .with(stderr_layer)
            .try_init();

        Ok(Self {
            log_file,
            _guard: guard,
        })
    }

    /// Path of the file this session appends to
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }
}

/// `log_DD-MM-YYYY.log` for the given day
pub fn log_file_name(now: &DateTime<Local>) -> String {
    format!("log_{}.log", now.format("%d-%m-%Y"))
}

fn write_separator(out: &mut impl Write, now: &DateTime<Local>) -> std::io::Result<()> {
    let line = "-".repeat(SEPARATOR_WIDTH);
    writeln!(out)?;
    writeln!(out, "{}", line)?;
    writeln!(
        out,
        "NEW EXECUTION SESSION STARTED AT: {}",
        now.format("%H:%M:%S")
    )?;
    writeln!(out, "{}", line)
}
