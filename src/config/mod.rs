//! Configuration module - YAML loading, typed settings and the artifact layout

mod loader;
mod paths;

pub use loader::*;
pub use paths::*;
