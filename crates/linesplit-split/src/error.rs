//! Error types for the splitter crate.

use std::io;
use std::path::PathBuf;

use linesplit_core::Segment;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("line limit must be at least 1")]
    InvalidLineLimit,

    #[error("cannot open source {path}: {source}")]
    SourceOpen { path: PathBuf, source: io::Error },

    #[error("read failed on {path} (last completed segment: {}): {source}", describe_last(.completed))]
    SourceRead {
        path: PathBuf,
        completed: Vec<Segment>,
        source: io::Error,
    },

    #[error("cannot write segment {index} to {path} (last completed segment: {}): {source}", describe_last(.completed))]
    SegmentWrite {
        index: usize,
        path: PathBuf,
        completed: Vec<Segment>,
        source: io::Error,
    },
}

impl SplitError {
    /// Segments fully written before the failure. They are left on disk.
    pub fn completed_segments(&self) -> &[Segment] {
        match self {
            Self::SourceRead { completed, .. } | Self::SegmentWrite { completed, .. } => completed,
            Self::InvalidLineLimit | Self::SourceOpen { .. } => &[],
        }
    }

    /// Index of the last segment written in full, if any.
    pub fn last_completed(&self) -> Option<usize> {
        self.completed_segments().last().map(|s| s.index)
    }
}

fn describe_last(completed: &[Segment]) -> String {
    match completed.last() {
        Some(segment) => segment.index.to_string(),
        None => "none".into(),
    }
}

pub type SplitResult<T> = Result<T, SplitError>;
