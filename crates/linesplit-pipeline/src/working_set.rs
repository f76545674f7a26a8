//! Per-run staging directories.
//!
//! A working set for `data.txt` is `data.txt-split`, or `data.txt-split-1`,
//! `data.txt-split-2`, ... when earlier runs left theirs behind. Names are
//! claimed with a single `create_dir`, so two runs can never share one.

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Staging directory owning every artifact of one file's run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkingSet {
    root: PathBuf,
}

impl WorkingSet {
    pub const ORIGINAL: &'static str = "original";
    pub const MANIFEST: &'static str = "manifest.json";
    pub const VERIFY: &'static str = "verify";
    pub const AUDIT_LOG: &'static str = "audit.log";
    pub const REPORT: &'static str = "report.json";

    /// Claim the first free working set name for `source`.
    pub fn create(source: &Path, marker: &str, max_attempts: u32) -> PipelineResult<Self> {
        for attempt in 0..max_attempts {
            let root = Self::candidate(source, marker, attempt);
            match fs::create_dir(&root) {
                Ok(()) => {
                    debug!(root = %root.display(), attempt, "working set created");
                    return Ok(Self { root });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(PipelineError::io("create working set", root, e)),
            }
        }
        Err(PipelineError::Collision {
            input: source.to_path_buf(),
            attempts: max_attempts,
        })
    }

    /// Name tried on the given attempt: `<source><marker>` first, then
    /// `<source><marker>-<attempt>`.
    pub fn candidate(source: &Path, marker: &str, attempt: u32) -> PathBuf {
        let mut name = OsString::from(source.as_os_str());
        name.push(marker);
        if attempt > 0 {
            name.push(format!("-{attempt}"));
        }
        PathBuf::from(name)
    }

    /// Copy `source` verbatim into the working set. Returns the bytes copied.
    pub fn stage_original(&self, source: &Path) -> PipelineResult<u64> {
        let dest = self.original();
        fs::copy(source, &dest).map_err(|e| PipelineError::io("stage", source, e))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn original(&self) -> PathBuf {
        self.root.join(Self::ORIGINAL)
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join(Self::MANIFEST)
    }

    pub fn verify(&self) -> PathBuf {
        self.root.join(Self::VERIFY)
    }

    pub fn audit_log(&self) -> PathBuf {
        self.root.join(Self::AUDIT_LOG)
    }

    pub fn report(&self) -> PathBuf {
        self.root.join(Self::REPORT)
    }
}
