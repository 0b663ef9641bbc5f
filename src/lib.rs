//! hotelcancel: hotel booking cancellation training pipeline
//!
//! Downloads a raw bookings table from object storage, splits it into train
//! and test sets, cleans, encodes, balances and reduces the features, then
//! trains and evaluates a random forest classifier. Stages hand off through
//! CSV files under `artifacts/`.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod storage;
pub mod utils;

pub use error::{PipelineError, Result};
