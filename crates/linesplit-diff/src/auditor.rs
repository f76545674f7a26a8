use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DiffError, DiffResult};
use crate::event::{AuditEvent, AuditOutcome};
use crate::log::AuditLog;
use crate::stream::{AuditStream, DEFAULT_WINDOW};

/// Per-outcome counts of an audit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTally {
    pub matches: u64,
    pub mismatches: u64,
    pub missing_in_original: u64,
    pub missing_in_reconstructed: u64,
    /// Non-match events excluded from the error count.
    pub ignored: u64,
}

impl AuditTally {
    /// Count one event from an audit stream.
    pub fn record(&mut self, event: &AuditEvent) {
        self.record_outcome(event.outcome(), event.is_ignored());
    }

    /// Count an outcome already classified, as read back from a log.
    pub fn record_outcome(&mut self, outcome: AuditOutcome, ignored: bool) {
        match outcome {
            AuditOutcome::Match => self.matches += 1,
            AuditOutcome::Mismatch => self.mismatches += 1,
            AuditOutcome::MissingInOriginal => self.missing_in_original += 1,
            AuditOutcome::MissingInReconstructed => self.missing_in_reconstructed += 1,
        }
        if ignored && outcome != AuditOutcome::Match {
            self.ignored += 1;
        }
    }

    /// Total number of events recorded.
    pub fn events(&self) -> u64 {
        self.matches + self.mismatches + self.missing_in_original + self.missing_in_reconstructed
    }

    /// Non-match events that were not ignored.
    pub fn error_count(&self) -> u64 {
        self.mismatches + self.missing_in_original + self.missing_in_reconstructed - self.ignored
    }
}

/// Outcome of auditing one pair of files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditResult {
    pub tally: AuditTally,
    pub error_count: u64,
    pub log_path: PathBuf,
}

impl AuditResult {
    /// No errors: the reconstruction is line-identical to the original,
    /// up to ignored events.
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// Streams two files through an [`AuditStream`] and records every event.
#[derive(Clone, Debug)]
pub struct DiffAuditor {
    window: usize,
    echo: bool,
}

impl Default for DiffAuditor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl DiffAuditor {
    /// An auditor buffering at most `window` lines per side (minimum 1).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            echo: false,
        }
    }

    /// Also emit each event through `tracing` as it is logged.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Lazily compare two readers.
    pub fn stream<A: BufRead, B: BufRead>(&self, original: A, reconstructed: B) -> AuditStream<A, B> {
        AuditStream::new(original, reconstructed, self.window)
    }

    /// Audit two readers, writing one line per event and a closing summary
    /// line to `log`.
    pub fn audit_readers<A, B, W>(&self, original: A, reconstructed: B, mut log: W) -> DiffResult<AuditTally>
    where
        A: BufRead,
        B: BufRead,
        W: Write,
    {
        let mut tally = AuditTally::default();
        for event in self.stream(original, reconstructed) {
            let event = event.map_err(DiffError::Stream)?;
            tally.record(&event);
            writeln!(log, "{event}").map_err(DiffError::LogWrite)?;
            if self.echo {
                info!(target: "linesplit::audit", "{event}");
            }
        }
        writeln!(log, "{}", AuditLog::summary_line(&tally)).map_err(DiffError::LogWrite)?;
        log.flush().map_err(DiffError::LogWrite)?;
        Ok(tally)
    }

    /// Audit `original` against `reconstructed`, creating a new audit log at
    /// `log_path`. An existing log is never overwritten.
    pub fn audit_files(&self, original: &Path, reconstructed: &Path, log_path: &Path) -> DiffResult<AuditResult> {
        let a = open(original)?;
        let b = open(reconstructed)?;
        let log = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(log_path)
            .map_err(DiffError::LogWrite)?;

        let tally = self.audit_readers(a, b, BufWriter::new(log))?;
        let error_count = tally.error_count();
        debug!(
            original = %original.display(),
            reconstructed = %reconstructed.display(),
            events = tally.events(),
            errors = error_count,
            "audit finished"
        );

        Ok(AuditResult {
            tally,
            error_count,
            log_path: log_path.to_path_buf(),
        })
    }
}

fn open(path: &Path) -> DiffResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DiffError::Open {
            path: path.to_path_buf(),
            source,
        })
}
