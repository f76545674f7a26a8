//! Bounded-concurrency batch runs and exit status mapping.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::{ExitPolicy, PipelineConfig};
use crate::error::PipelineError;
use crate::pipeline::Pipeline;
use crate::report::{FileFailure, FileReport};
use crate::stage::FileState;

pub const EXIT_OK: u8 = 0;
/// At least one file failed.
pub const EXIT_FAILED: u8 = 1;
/// Bad arguments or no usable inputs.
pub const EXIT_USAGE: u8 = 2;
/// Strict mode only: every file was processed but audits found errors.
pub const EXIT_AUDIT_ERRORS: u8 = 3;

/// Reports for every input of a batch, in input order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub reports: Vec<FileReport>,
}

/// Totals folded from the reports of a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub files: usize,
    pub reported: usize,
    pub failed: usize,
    /// Reported files whose audit found at least one error.
    pub with_mismatches: usize,
    pub segments: usize,
    pub errors: u64,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        self.reports
            .iter()
            .fold(BatchSummary::default(), |mut acc, report| {
                acc.files += 1;
                acc.segments += report.segments.len();
                acc.errors += report.error_count();
                if report.is_failed() {
                    acc.failed += 1;
                } else {
                    acc.reported += 1;
                    if report.has_mismatches() {
                        acc.with_mismatches += 1;
                    }
                }
                acc
            })
    }

    pub fn failed(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.is_failed())
    }

    pub fn with_mismatches(&self) -> impl Iterator<Item = &FileReport> {
        self.reports
            .iter()
            .filter(|r| !r.is_failed() && r.has_mismatches())
    }

    /// Process exit status for this batch under `policy`.
    pub fn exit_code(&self, policy: ExitPolicy) -> u8 {
        let summary = self.summary();
        if summary.failed > 0 {
            EXIT_FAILED
        } else if policy == ExitPolicy::Strict && summary.errors > 0 {
            EXIT_AUDIT_ERRORS
        } else {
            EXIT_OK
        }
    }
}

/// Run every file through the pipeline, at most `config.concurrency` at a
/// time.
///
/// Each file's stages run on a blocking worker thread. A failing file never
/// stops the others, and reports come back in the order of `files`.
pub async fn run_batch(files: Vec<PathBuf>, config: PipelineConfig) -> BatchReport {
    let concurrency = config.concurrency.max(1);
    info!(files = files.len(), concurrency, "batch started");

    let pipeline = Arc::new(Pipeline::new(config));
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();

    for (position, file) in files.iter().cloned().enumerate() {
        let pipeline = Arc::clone(&pipeline);
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let report = match semaphore.acquire_owned().await {
                Ok(permit) => {
                    let input = file.clone();
                    let joined = tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        pipeline.run_file(&input)
                    })
                    .await;
                    joined.unwrap_or_else(|e| worker_failure(&file, e.to_string()))
                }
                Err(e) => worker_failure(&file, e.to_string()),
            };
            (position, report)
        });
    }

    let mut slots: Vec<Option<FileReport>> = vec![None; files.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((position, report)) => slots[position] = Some(report),
            Err(e) => warn!(error = %e, "batch task did not complete"),
        }
    }

    let reports: Vec<FileReport> = slots
        .into_iter()
        .zip(&files)
        .map(|(slot, file)| slot.unwrap_or_else(|| worker_failure(file, "task aborted".into())))
        .collect();

    let batch = BatchReport { reports };
    let summary = batch.summary();
    info!(
        files = summary.files,
        reported = summary.reported,
        failed = summary.failed,
        errors = summary.errors,
        "batch finished"
    );
    batch
}

fn worker_failure(file: &Path, reason: String) -> FileReport {
    let err = PipelineError::Worker {
        input: file.to_path_buf(),
        reason,
    };
    let mut report = FileReport::new(file, 0);
    report.state = FileState::Failed;
    report.failure = Some(FileFailure {
        stage: FileState::Staging,
        message: err.to_string(),
    });
    report
}
