//! Pipeline module - stages, transforms and the driver that chains them

pub mod balance;
pub mod clean;
pub mod encode;
pub mod forest;
pub mod ingestion;
pub mod loader;
pub mod matrix;
pub mod processing;
pub mod runner;
pub mod selection;
pub mod skew;
pub mod split;
pub mod target;

pub use balance::*;
pub use clean::*;
pub use encode::*;
pub use ingestion::*;
pub use loader::*;
pub use processing::*;
pub use runner::*;
pub use selection::*;
pub use skew::*;
pub use split::*;
