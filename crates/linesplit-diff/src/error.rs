//! Error types for the audit crate.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while auditing or reading an audit log.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// An input file could not be opened.
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Reading one of the compared streams failed mid-audit.
    #[error("cannot stream audit inputs: {0}")]
    Stream(#[source] io::Error),

    /// The audit log could not be created or written.
    #[error("cannot write audit log: {0}")]
    LogWrite(#[source] io::Error),

    /// The audit log could not be read back.
    #[error("cannot read audit log {path}: {source}")]
    LogRead { path: PathBuf, source: io::Error },

    /// The audit log ends without its summary line.
    #[error("audit log {path} is truncated: no summary line")]
    LogTruncated { path: PathBuf },

    /// A line of the audit log could not be parsed.
    #[error("audit log {path} is corrupt at line {line}: {reason}")]
    LogCorrupt {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// The summary line disagrees with the events in the log.
    #[error("audit log {path} summary says {recorded_events} events / {recorded_errors} errors, found {counted_events} / {counted_errors}")]
    LogSummaryMismatch {
        path: PathBuf,
        recorded_events: u64,
        recorded_errors: u64,
        counted_events: u64,
        counted_errors: u64,
    },
}

/// Convenience alias for audit results.
pub type DiffResult<T> = Result<T, DiffError>;
