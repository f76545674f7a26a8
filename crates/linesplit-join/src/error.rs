//! Error types for the reassembly crate.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while reassembling segments.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    /// A segment file could not be opened or read.
    #[error("cannot read segment {index} at {path}: {source}")]
    SegmentRead {
        index: usize,
        path: PathBuf,
        source: io::Error,
    },

    /// The verification file could not be created or written.
    #[error("cannot write verification file {path}: {source}")]
    DestinationWrite { path: PathBuf, source: io::Error },
}

/// Convenience alias for reassembly results.
pub type JoinResult<T> = Result<T, JoinError>;
