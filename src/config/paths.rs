//! Fixed artifact layout shared by every stage
//!
//! Stages never hand data to each other in memory; each one reads the files the
//! previous stage wrote at these locations.

use std::path::{Path, PathBuf};

/// Default configuration file location, relative to the working directory
pub const CONFIG_PATH: &str = "config/config.yaml";

/// Default directory for daily log files
pub const LOG_DIR: &str = "logs";

/// Default root for every data and model artifact
pub const ARTIFACT_ROOT: &str = "artifacts";

/// Locations of the raw, split, processed and model artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub raw_dir: PathBuf,
    pub raw_file: PathBuf,
    pub train_file: PathBuf,
    pub test_file: PathBuf,
    pub processed_dir: PathBuf,
    pub processed_train_file: PathBuf,
    pub processed_test_file: PathBuf,
    pub model_dir: PathBuf,
    pub model_file: PathBuf,
}

impl ArtifactPaths {
    /// Lay out all artifacts beneath `root`
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let raw_dir = root.join("raw");
        let processed_dir = root.join("processed");
        let model_dir = root.join("models");

        Self {
            raw_file: raw_dir.join("raw.csv"),
            train_file: raw_dir.join("train.csv"),
            test_file: raw_dir.join("test.csv"),
            raw_dir,
            processed_train_file: processed_dir.join("processed_train.csv"),
            processed_test_file: processed_dir.join("processed_test.csv"),
            processed_dir,
            model_file: model_dir.join("model.json"),
            model_dir,
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::with_root(ARTIFACT_ROOT)
    }
}

/// Create `dir` and its parents if they do not exist yet
pub fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.raw_file, PathBuf::from("artifacts/raw/raw.csv"));
        assert_eq!(paths.train_file, PathBuf::from("artifacts/raw/train.csv"));
        assert_eq!(paths.test_file, PathBuf::from("artifacts/raw/test.csv"));
        assert_eq!(
            paths.processed_train_file,
            PathBuf::from("artifacts/processed/processed_train.csv")
        );
        assert_eq!(paths.model_file, PathBuf::from("artifacts/models/model.json"));
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("a").join("b");
        ensure_dir(&dir).unwrap();
        ensure_dir(&dir).unwrap();
        assert!(dir.is_dir());
    }
}
