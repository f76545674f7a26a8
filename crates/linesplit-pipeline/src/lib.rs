//! Split-and-verify orchestration for linesplit.
//!
//! Each source file moves through a fixed sequence of stages inside its own
//! working set directory:
//!
//! `STAGING -> SPLITTING -> REASSEMBLING -> AUDITING -> REPORTED`
//!
//! with `FAILED` reachable from any stage. Files are independent: a batch
//! runs several at once under a concurrency bound, and every file yields a
//! [`FileReport`] value that the caller folds into a [`BatchSummary`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use linesplit_pipeline::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let report = pipeline.run_file(std::path::Path::new("big.txt"));
//! println!("{} -> {} errors", report.state, report.error_count());
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod stage;
pub mod working_set;

pub use batch::{
    run_batch, BatchReport, BatchSummary, EXIT_AUDIT_ERRORS, EXIT_FAILED, EXIT_OK, EXIT_USAGE,
};
pub use config::{ExitPolicy, PipelineConfig, DEFAULT_MAX_LINES, DEFAULT_SPLIT_MARKER};
pub use error::{ConfigError, PipelineError, PipelineResult};
pub use pipeline::Pipeline;
pub use report::{FileFailure, FileReport};
pub use stage::{FileState, StageRecord};
pub use working_set::WorkingSet;

// Re-exported so the binary needs no direct dependency on the stage crates.
pub use linesplit_diff::DEFAULT_WINDOW;
pub use linesplit_join::BoundaryNormalizer;
