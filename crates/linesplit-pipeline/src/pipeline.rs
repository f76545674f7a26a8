//! Per-file orchestration of the split-and-verify stages.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use linesplit_core::SplitManifest;
use linesplit_diff::{AuditLog, AuditResult, DiffAuditor};
use linesplit_join::Reassembler;
use linesplit_split::LineSplitter;
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::report::{FileFailure, FileReport};
use crate::stage::{FileState, StageRecord};
use crate::working_set::WorkingSet;

/// Runs the split-and-verify stages for one file at a time.
///
/// Stages run strictly in order; the first failing stage ends the run and
/// is recorded in the report. Audit mismatches are findings, not failures.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// A pipeline running every file with `config`.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process `source` from staging through to its report.
    pub fn run_file(&self, source: &Path) -> FileReport {
        let mut report = FileReport::new(source, self.config.max_lines);
        let started = Instant::now();

        match self.drive(source, &mut report) {
            Ok(()) => {
                info!(
                    source = %source.display(),
                    segments = report.segments.len(),
                    errors = report.error_count(),
                    working_set = %display_opt(report.working_set.as_deref()),
                    audit_log = %display_opt(report.audit_log()),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "file reported"
                );
            }
            Err(err) => {
                let stage = report.state;
                warn!(source = %source.display(), stage = %stage, error = %err, "file failed");
                report.state = FileState::Failed;
                report.failure = Some(FileFailure {
                    stage,
                    message: err.to_string(),
                });
                report.finished_at = Some(Utc::now());
                if let Some(root) = report.working_set.clone() {
                    if let Err(e) = report.write_atomic(&root.join(WorkingSet::REPORT)) {
                        warn!(source = %source.display(), error = %e, "could not write failure report");
                    }
                }
            }
        }
        report
    }

    fn drive(&self, source: &Path, report: &mut FileReport) -> PipelineResult<()> {
        let ws = timed(report, |report| {
            let ws = WorkingSet::create(
                source,
                &self.config.split_marker,
                self.config.max_working_set_attempts,
            )?;
            report.working_set = Some(ws.root().to_path_buf());
            let bytes = ws.stage_original(source)?;
            debug!(source = %source.display(), bytes, "original staged");
            Ok(ws)
        })?;

        timed(report, |report| {
            let splitter = LineSplitter::new(self.config.max_lines)?;
            let manifest = match splitter.split(&ws.original(), ws.root()) {
                Ok(manifest) => manifest,
                Err(e) => {
                    report.segments = e.completed_segments().to_vec();
                    return Err(e.into());
                }
            };
            report.segments = manifest.segments.clone();
            report.total_lines = Some(manifest.total_lines);
            manifest.validate()?;
            manifest.write_json(&ws.manifest())?;
            Ok(())
        })?;

        timed(report, |report| {
            // Order comes from the persisted manifest, never the directory.
            let manifest = SplitManifest::read_json(&ws.manifest())?;
            let reassembly = Reassembler::new(self.config.normalizer)
                .reassemble(&manifest.segments, &ws.verify())?;
            report.collapsed_joins = reassembly.collapsed_count();
            Ok(())
        })?;

        timed(report, |report| {
            let auditor =
                DiffAuditor::new(self.config.audit_window).with_echo(self.config.echo_events);
            let result = auditor.audit_files(&ws.original(), &ws.verify(), &ws.audit_log())?;
            report.original_digest = Some(digest_file(&ws.original())?);
            report.verify_digest = Some(digest_file(&ws.verify())?);
            review_audit(report, &result);
            report.audit = Some(result);
            Ok(())
        })?;

        // The persisted report carries the records of the stages before it.
        timed(report, |report| {
            report.finished_at = Some(Utc::now());
            report.write_atomic(&ws.report())
        })
    }
}

/// Run the stage named by `report.state` and record its timing.
///
/// On success the report moves to the following state; on failure it stays
/// on the stage that failed.
fn timed<T>(
    report: &mut FileReport,
    f: impl FnOnce(&mut FileReport) -> PipelineResult<T>,
) -> PipelineResult<T> {
    let stage = report.state;
    debug!(source = %report.source.display(), stage = %stage, "stage started");
    let start = Instant::now();
    let result = f(report);
    report.stages.push(StageRecord {
        stage,
        elapsed: start.elapsed(),
        ok: result.is_ok(),
    });
    if result.is_ok() {
        if let Some(next) = stage.next() {
            report.state = next;
        }
    }
    result
}

/// Cross-check a finished audit against its persisted log and the file
/// digests. Disagreements become report warnings, never failures.
fn review_audit(report: &mut FileReport, result: &AuditResult) {
    match AuditLog::read(&result.log_path) {
        Ok(summary) if summary.error_count != result.error_count => {
            report.warnings.push(format!(
                "audit log reports {} errors, audit counted {}",
                summary.error_count, result.error_count
            ));
        }
        Ok(_) => {}
        Err(e) => report.warnings.push(e.to_string()),
    }

    if result.is_clean() && report.digests_match() == Some(false) {
        report
            .warnings
            .push("verification file differs from the original despite a clean audit".into());
    }

    for warning in &report.warnings {
        warn!(source = %report.source.display(), %warning, "audit warning");
    }
}

/// Hex BLAKE3 digest of a file's contents.
fn digest_file(path: &Path) -> PipelineResult<String> {
    let mut file = File::open(path).map_err(|e| PipelineError::io("hash", path, e))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher).map_err(|e| PipelineError::io("hash", path, e))?;
    Ok(hasher.finalize().to_hex().to_string())
}

fn display_opt(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string()).unwrap_or_default()
}
