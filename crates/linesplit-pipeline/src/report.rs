//! Per-file run reports and their JSON persistence.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use linesplit_core::Segment;
use linesplit_diff::AuditResult;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::stage::{FileState, StageRecord};

/// Why a file ended in [`FileState::Failed`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Stage that was running when the failure occurred.
    pub stage: FileState,
    pub message: String,
}

/// Everything known about one source file after its run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileReport {
    pub source: PathBuf,
    pub state: FileState,
    pub working_set: Option<PathBuf>,
    pub max_lines: u64,
    pub total_lines: Option<u64>,
    /// Segments written, including a partial list when splitting failed.
    pub segments: Vec<Segment>,
    /// Join points where the normalizer dropped a terminator.
    pub collapsed_joins: usize,
    pub audit: Option<AuditResult>,
    /// BLAKE3 of the staged original.
    pub original_digest: Option<String>,
    /// BLAKE3 of the reassembled verification file.
    pub verify_digest: Option<String>,
    /// Non-fatal problems, such as an audit log that does not read back or
    /// a clean audit over files whose digests differ.
    pub warnings: Vec<String>,
    pub stages: Vec<StageRecord>,
    pub failure: Option<FileFailure>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl FileReport {
    pub fn new(source: impl Into<PathBuf>, max_lines: u64) -> Self {
        Self {
            source: source.into(),
            state: FileState::Staging,
            working_set: None,
            max_lines,
            total_lines: None,
            segments: Vec::new(),
            collapsed_joins: 0,
            audit: None,
            original_digest: None,
            verify_digest: None,
            warnings: Vec::new(),
            stages: Vec::new(),
            failure: None,
            finished_at: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.state == FileState::Failed
    }

    /// Audit errors found for this file; zero when no audit ran.
    pub fn error_count(&self) -> u64 {
        self.audit.as_ref().map_or(0, |a| a.error_count)
    }

    pub fn has_mismatches(&self) -> bool {
        self.error_count() > 0
    }

    /// Whether the verification file is byte-identical to the original.
    pub fn digests_match(&self) -> Option<bool> {
        match (&self.original_digest, &self.verify_digest) {
            (Some(a), Some(b)) => Some(a == b),
            _ => None,
        }
    }

    pub fn audit_log(&self) -> Option<&Path> {
        self.audit.as_ref().map(|a| a.log_path.as_path())
    }

    /// Write the report as JSON to `path`, replacing it in one step.
    ///
    /// The JSON goes to a temporary file in the same directory, which is
    /// then renamed over `path`, so readers never see a partial report.
    pub fn write_atomic(&self, path: &Path) -> PipelineResult<()> {
        let report_err = |reason: String| PipelineError::Report {
            path: path.to_path_buf(),
            reason,
        };
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| report_err(e.to_string()))?;
        serde_json::to_writer_pretty(&mut tmp, self).map_err(|e| report_err(e.to_string()))?;
        tmp.write_all(b"\n").map_err(|e| report_err(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| report_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| report_err(e.error.to_string()))?;
        Ok(())
    }

    /// Load a report written by [`FileReport::write_atomic`].
    pub fn read(path: &Path) -> PipelineResult<Self> {
        let data = std::fs::read(path).map_err(|e| PipelineError::io("read report", path, e))?;
        serde_json::from_slice(&data).map_err(|e| PipelineError::Report {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linesplit_diff::AuditTally;
    use std::time::Duration;

    fn reported() -> FileReport {
        let mut report = FileReport::new("/data/in.txt", 3);
        report.state = FileState::Reported;
        report.total_lines = Some(7);
        report.audit = Some(AuditResult {
            tally: AuditTally {
                matches: 6,
                mismatches: 1,
                ..AuditTally::default()
            },
            error_count: 1,
            log_path: PathBuf::from("/data/in.txt-split/audit.log"),
        });
        report.stages.push(StageRecord {
            stage: FileState::Splitting,
            elapsed: Duration::from_millis(12),
            ok: true,
        });
        report.finished_at = Some(Utc::now());
        report
    }

    #[test]
    fn error_count_comes_from_audit() {
        let report = reported();
        assert_eq!(report.error_count(), 1);
        assert!(report.has_mismatches());
        assert!(!report.is_failed());
        assert_eq!(FileReport::new("x", 1).error_count(), 0);
    }

    #[test]
    fn digests_compare_when_both_present() {
        let mut report = FileReport::new("x", 1);
        assert_eq!(report.digests_match(), None);
        report.original_digest = Some("ab".into());
        report.verify_digest = Some("ab".into());
        assert_eq!(report.digests_match(), Some(true));
        report.verify_digest = Some("cd".into());
        assert_eq!(report.digests_match(), Some(false));
    }

    #[test]
    fn atomic_write_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = reported();
        report.write_atomic(&path).unwrap();

        let back = FileReport::read(&path).unwrap();
        assert_eq!(back.state, FileState::Reported);
        assert_eq!(back.error_count(), 1);
        assert_eq!(back.stages, report.stages);
        // Only the report itself, no leftover temp file.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn atomic_write_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "stale").unwrap();
        reported().write_atomic(&path).unwrap();
        assert!(FileReport::read(&path).is_ok());
    }

    #[test]
    fn failure_serializes_stage() {
        let failure = FileFailure {
            stage: FileState::Splitting,
            message: "disk full".into(),
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["stage"], "SPLITTING");
    }
}
