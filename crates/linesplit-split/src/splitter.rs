use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use linesplit_core::{LineEnding, LineReader, Segment, SplitManifest};
use tracing::{debug, info};

use crate::error::{SplitError, SplitResult};

/// A segment file that is still receiving lines.
struct OpenSegment {
    index: usize,
    path: PathBuf,
    writer: BufWriter<File>,
    first_line: u64,
    line_count: u64,
    byte_len: u64,
}

impl OpenSegment {
    fn create(dir: &Path, index: usize, first_line: u64) -> std::io::Result<Self> {
        let path = dir.join(Segment::file_name(index));
        // Never overwrite a segment left behind by an earlier run.
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok(Self {
            index,
            path,
            writer: BufWriter::new(file),
            first_line,
            line_count: 0,
            byte_len: 0,
        })
    }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(line)?;
        self.line_count += 1;
        self.byte_len += line.len() as u64;
        Ok(())
    }

    fn finish(mut self) -> std::io::Result<Segment> {
        self.writer.flush()?;
        Ok(Segment {
            index: self.index,
            path: self.path,
            first_line: self.first_line,
            line_count: self.line_count,
            byte_len: self.byte_len,
        })
    }
}

/// Splits a text file into segments of at most `max_lines` lines.
#[derive(Clone, Debug)]
pub struct LineSplitter {
    max_lines: u64,
}

impl LineSplitter {
    /// Create a splitter. A limit of zero is rejected.
    pub fn new(max_lines: u64) -> SplitResult<Self> {
        if max_lines == 0 {
            return Err(SplitError::InvalidLineLimit);
        }
        Ok(Self { max_lines })
    }

    /// Split `source` into segment files under `dest_dir`.
    ///
    /// Segments are opened lazily, so an empty source produces no files and
    /// no segment is ever empty. On failure the segments completed so far
    /// stay on disk and are carried in the error.
    pub fn split(&self, source: &Path, dest_dir: &Path) -> SplitResult<SplitManifest> {
        let file = File::open(source).map_err(|e| SplitError::SourceOpen {
            path: source.to_path_buf(),
            source: e,
        })?;
        let mut reader = LineReader::new(BufReader::new(file));

        let mut segments: Vec<Segment> = Vec::new();
        let mut current: Option<OpenSegment> = None;
        let mut line = Vec::new();
        let mut total_lines = 0u64;
        let mut total_bytes = 0u64;
        let mut line_ending = None;

        loop {
            line.clear();
            let read = reader.read_line(&mut line).map_err(|e| SplitError::SourceRead {
                path: source.to_path_buf(),
                completed: std::mem::take(&mut segments),
                source: e,
            })?;
            if read == 0 {
                break;
            }
            if line_ending.is_none() {
                line_ending = LineEnding::of_line(&line);
            }

            let mut open = match current.take() {
                Some(open) => open,
                None => {
                    let index = segments.len();
                    OpenSegment::create(dest_dir, index, total_lines).map_err(|e| {
                        SplitError::SegmentWrite {
                            index,
                            path: dest_dir.join(Segment::file_name(index)),
                            completed: std::mem::take(&mut segments),
                            source: e,
                        }
                    })?
                }
            };
            open.write_line(&line).map_err(|e| SplitError::SegmentWrite {
                index: open.index,
                path: open.path.clone(),
                completed: std::mem::take(&mut segments),
                source: e,
            })?;

            total_lines += 1;
            total_bytes += read as u64;

            if open.line_count >= self.max_lines {
                self.close(open, &mut segments)?;
            } else {
                current = Some(open);
            }
        }

        if let Some(rest) = current.take() {
            self.close(rest, &mut segments)?;
        }

        info!(
            source = %source.display(),
            segments = segments.len(),
            lines = total_lines,
            bytes = total_bytes,
            "split complete"
        );

        Ok(SplitManifest {
            source: source.to_path_buf(),
            max_lines: self.max_lines,
            total_lines,
            total_bytes,
            line_ending,
            segments,
        })
    }

    fn close(&self, open: OpenSegment, segments: &mut Vec<Segment>) -> SplitResult<()> {
        let index = open.index;
        let path = open.path.clone();
        let segment = open.finish().map_err(|e| SplitError::SegmentWrite {
            index,
            path,
            completed: std::mem::take(segments),
            source: e,
        })?;
        debug!(
            index = segment.index,
            first_line = segment.first_line,
            lines = segment.line_count,
            bytes = segment.byte_len,
            "segment written"
        );
        segments.push(segment);
        Ok(())
    }
}
