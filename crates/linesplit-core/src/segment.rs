//! Segments and the split manifest.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ending::LineEnding;
use crate::error::{CoreError, CoreResult};

/// File name prefix for segment files inside a working set.
pub const SEGMENT_PREFIX: &str = "file-";

/// One materialized chunk of a source file.
///
/// Covers the 0-based line range `[first_line, first_line + line_count)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position in the split order (0-based).
    pub index: usize,
    /// Location of the segment file.
    pub path: PathBuf,
    /// First source line held by this segment.
    pub first_line: u64,
    /// Number of lines held.
    pub line_count: u64,
    /// Exact number of bytes the splitter wrote.
    pub byte_len: u64,
}

impl Segment {
    /// One past the last source line held by this segment.
    pub fn end_line(&self) -> u64 {
        self.first_line + self.line_count
    }

    /// Deterministic file name for the segment at `index`, e.g. `file-00007`.
    pub fn file_name(index: usize) -> String {
        format!("{SEGMENT_PREFIX}{index:05}")
    }
}

/// Ordered record of a completed split.
///
/// Downstream stages take their segment order from here, never from a
/// directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitManifest {
    /// The file that was split.
    pub source: PathBuf,
    /// Line limit the split was run with.
    pub max_lines: u64,
    /// Total lines read from the source.
    pub total_lines: u64,
    /// Total bytes read from the source.
    pub total_bytes: u64,
    /// Style of the first terminator seen, if the source had any.
    pub line_ending: Option<LineEnding>,
    /// Segments in split order.
    pub segments: Vec<Segment>,
}

impl SplitManifest {
    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Check that the segments partition `[0, total_lines)` in order and
    /// respect the line limit.
    pub fn validate(&self) -> CoreResult<()> {
        let mut next_line = 0u64;
        let mut bytes = 0u64;
        for (position, segment) in self.segments.iter().enumerate() {
            if segment.index != position {
                return Err(CoreError::InvalidManifest(format!(
                    "segment at position {position} has index {}",
                    segment.index
                )));
            }
            if segment.first_line != next_line {
                return Err(CoreError::InvalidManifest(format!(
                    "segment {} starts at line {} but line {next_line} was expected",
                    segment.index, segment.first_line
                )));
            }
            if segment.line_count == 0 || segment.line_count > self.max_lines {
                return Err(CoreError::InvalidManifest(format!(
                    "segment {} holds {} lines (limit {})",
                    segment.index, segment.line_count, self.max_lines
                )));
            }
            next_line = segment.end_line();
            bytes += segment.byte_len;
        }
        if next_line != self.total_lines {
            return Err(CoreError::InvalidManifest(format!(
                "segments cover {next_line} lines, source has {}",
                self.total_lines
            )));
        }
        if bytes != self.total_bytes {
            return Err(CoreError::InvalidManifest(format!(
                "segments hold {bytes} bytes, source has {}",
                self.total_bytes
            )));
        }
        Ok(())
    }

    /// Write the manifest as pretty JSON.
    pub fn write_json(&self, path: &Path) -> CoreResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a manifest written by [`Self::write_json`].
    pub fn read_json(path: &Path) -> CoreResult<Self> {
        let data = fs::read(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&data)?)
    }
}
