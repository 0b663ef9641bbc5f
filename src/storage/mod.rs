//! Object storage collaborators used by the ingestion stage

mod gcs;
mod local;

use std::path::Path;

use anyhow::Result;

pub use gcs::*;
pub use local::*;

/// Environment variable that switches ingestion to a local directory store
pub const LOCAL_ROOT_ENV: &str = "STORAGE_LOCAL_ROOT";

/// One object in a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub project_id: Option<String>,
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(project_id: Option<String>, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            project_id,
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Fetches a single object and writes it to a local file.
///
/// Implementations overwrite `dest` if it exists and return the number of
/// bytes written.
pub trait ObjectStore {
    fn download(&self, location: &ObjectLocation, dest: &Path) -> Result<u64>;
}

/// Pick the store for this process: a local directory when
/// `STORAGE_LOCAL_ROOT` is set, the cloud client otherwise.
pub fn store_from_env() -> Result<Box<dyn ObjectStore>> {
    match std::env::var_os(LOCAL_ROOT_ENV) {
        Some(root) => Ok(Box::new(LocalStore::new(root))),
        None => Ok(Box::new(GcsStore::from_env()?)),
    }
}
