//! Error taxonomy for the training pipeline
//!
//! Helper functions return `anyhow::Result` and attach context as they go.
//! Each stage operation converts its failure into a [`PipelineError`] exactly
//! once, at its own boundary, recording the call site where that happened.

use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;

/// Which pipeline step a [`StageError`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorKind {
    Load,
    Download,
    Split,
    Preprocess,
    Balance,
    FeatureSelection,
    Save,
    Training,
}

impl fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageErrorKind::Load => "load",
            StageErrorKind::Download => "download",
            StageErrorKind::Split => "split",
            StageErrorKind::Preprocess => "preprocess",
            StageErrorKind::Balance => "balance",
            StageErrorKind::FeatureSelection => "feature selection",
            StageErrorKind::Save => "save",
            StageErrorKind::Training => "training",
        };
        write!(f, "{}", name)
    }
}

/// A failure inside a stage, with the location that reported it
#[derive(Debug)]
pub struct StageError {
    pub kind: StageErrorKind,
    pub location: &'static Location<'static>,
    pub source: anyhow::Error,
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error at {}:{}: {:#}",
            self.kind,
            self.location.file(),
            self.location.line(),
            self.source
        )
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Top-level error returned by every stage operation and by the pipeline driver
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("failed to parse configuration file {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration value for '{field}': {reason}")]
    ConfigInvalid { field: String, reason: String },

    #[error(transparent)]
    Stage(#[from] StageError),
}

impl PipelineError {
    /// Wrap `source` as a stage failure located at the caller
    #[track_caller]
    pub fn stage(kind: StageErrorKind, source: impl Into<anyhow::Error>) -> Self {
        PipelineError::Stage(StageError {
            kind,
            location: Location::caller(),
            source: source.into(),
        })
    }

    /// The stage kind, if this is a stage failure
    pub fn stage_kind(&self) -> Option<StageErrorKind> {
        match self {
            PipelineError::Stage(err) => Some(err.kind),
            _ => None,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

/// Converts helper results into [`PipelineError`] at a stage boundary.
///
/// A source that already is a `PipelineError` passes through unchanged, so
/// composite operations do not stack wrappers.
pub trait StageResultExt<T> {
    fn stage(self, kind: StageErrorKind) -> Result<T>;
}

impl<T, E> StageResultExt<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    #[track_caller]
    fn stage(self, kind: StageErrorKind) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(err) => {
                let err: anyhow::Error = err.into();
                match err.downcast::<PipelineError>() {
                    Ok(inner) => Err(inner),
                    Err(err) => Err(PipelineError::stage(kind, err)),
                }
            }
        }
    }
}
