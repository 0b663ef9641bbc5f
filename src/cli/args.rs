//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};

use crate::pipeline::Stage;

/// hotelcancel - Train a hotel booking cancellation classifier.
///
/// Reads config/config.yaml, writes artifacts/ and logs/ in the working
/// directory. All settings come from the configuration file.
#[derive(Parser, Debug)]
#[command(name = "hotelcancel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run ingestion, processing and training in order (default)
    Run,
    /// Download the raw data and split it into train and test sets
    Ingest,
    /// Clean, encode, balance and select features from the split data
    Process,
    /// Train and evaluate the model on the processed data
    Train,
}

impl Cli {
    /// The stages this invocation runs, in order
    pub fn stages(&self) -> Vec<Stage> {
        match self.command.unwrap_or(Commands::Run) {
            Commands::Run => Stage::ALL.to_vec(),
            Commands::Ingest => vec![Stage::Ingestion],
            Commands::Process => vec![Stage::Processing],
            Commands::Train => vec![Stage::Training],
        }
    }
}
