use std::io;
use std::path::PathBuf;

use linesplit_core::CoreError;
use linesplit_diff::DiffError;
use linesplit_join::JoinError;
use linesplit_split::SplitError;

/// Errors raised while loading pipeline configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that abort processing of a single file.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A filesystem operation owned by the pipeline failed.
    #[error("cannot {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: io::Error,
    },

    /// Every candidate working set name is already taken.
    #[error("no free working set name for {input} after {attempts} attempts")]
    Collision { input: PathBuf, attempts: u32 },

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error(transparent)]
    Join(#[from] JoinError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The per-file report could not be persisted.
    #[error("cannot write report {path}: {reason}")]
    Report { path: PathBuf, reason: String },

    /// A worker task panicked or was cancelled.
    #[error("worker for {input} did not complete: {reason}")]
    Worker { input: PathBuf, reason: String },
}

impl PipelineError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
