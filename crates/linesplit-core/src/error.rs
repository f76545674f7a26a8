//! Error types for the line model.

use std::path::PathBuf;

/// Errors raised while persisting or validating split manifests.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Manifest file could not be read or written.
    #[error("manifest I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest JSON could not be encoded or decoded.
    #[error("manifest serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The segment list violates the partition invariants.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

/// Convenience alias for line-model results.
pub type CoreResult<T> = Result<T, CoreError>;
