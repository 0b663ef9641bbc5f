//! Directory-backed object store for offline runs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::{ObjectLocation, ObjectStore};

/// Serves `root/<bucket>/<key>` as objects
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, location: &ObjectLocation) -> PathBuf {
        self.root.join(&location.bucket).join(&location.key)
    }
}

impl ObjectStore for LocalStore {
    fn download(&self, location: &ObjectLocation, dest: &Path) -> Result<u64> {
        let source = self.object_path(location);
        let bytes = std::fs::copy(&source, dest).with_context(|| {
            format!(
                "Failed to copy object {} to {}",
                source.display(),
                dest.display()
            )
        })?;
        info!("Copied {} bytes from {}", bytes, source.display());
        Ok(bytes)
    }
}
