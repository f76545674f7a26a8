use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use linesplit_core::{LineEnding, Segment};
use tracing::{debug, info, warn};

use crate::error::{JoinError, JoinResult};
use crate::normalizer::BoundaryNormalizer;

/// A boundary between two consecutive segments in the verification file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinPoint {
    /// Index of the segment that ends at this boundary.
    pub after_segment: usize,
    /// Byte offset in the verification file where the next segment begins.
    pub offset: u64,
    /// Terminator dropped by the normalizer at this boundary, if any.
    pub collapsed: Option<LineEnding>,
}

/// Result of a reassembly run.
#[derive(Clone, Debug)]
pub struct Reassembly {
    /// The verification file that was written.
    pub path: PathBuf,
    pub bytes_written: u64,
    /// One entry per boundary between consecutive segments.
    pub joins: Vec<JoinPoint>,
}

impl Reassembly {
    /// Number of boundaries where a terminator was dropped.
    pub fn collapsed_count(&self) -> usize {
        self.joins.iter().filter(|j| j.collapsed.is_some()).count()
    }
}

/// Concatenates segments, in caller order, into one verification file.
#[derive(Clone, Debug, Default)]
pub struct Reassembler {
    normalizer: BoundaryNormalizer,
}

impl Reassembler {
    /// Create a reassembler that repairs join points with `normalizer`.
    pub fn new(normalizer: BoundaryNormalizer) -> Self {
        Self { normalizer }
    }

    /// Write `segments` back to back into a new file at `dest`.
    ///
    /// The order of `segments` is used as given. `dest` must not exist.
    pub fn reassemble(&self, segments: &[Segment], dest: &Path) -> JoinResult<Reassembly> {
        let write_err = |source| JoinError::DestinationWrite {
            path: dest.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .map_err(write_err)?;
        let mut out = BufWriter::new(file);

        let mut offset = 0u64;
        let mut joins = Vec::with_capacity(segments.len().saturating_sub(1));

        for (position, segment) in segments.iter().enumerate() {
            let is_join = position + 1 < segments.len();
            let read_err = |source| JoinError::SegmentRead {
                index: segment.index,
                path: segment.path.clone(),
                source,
            };

            let mut input = File::open(&segment.path).map_err(read_err)?;
            let actual_len = input.metadata().map_err(read_err)?.len();

            let mut collapsed = None;
            if is_join && actual_len > segment.byte_len {
                let tail = read_tail(&mut input, actual_len).map_err(read_err)?;
                collapsed = self
                    .normalizer
                    .collapse_at_join(segment.byte_len, actual_len, &tail);
            }
            if actual_len != segment.byte_len && collapsed.is_none() {
                warn!(
                    index = segment.index,
                    recorded = segment.byte_len,
                    actual = actual_len,
                    "segment size differs from manifest"
                );
            }

            let keep = actual_len - collapsed.map_or(0, |e| e.len() as u64);
            let copied = copy_prefix(input, keep, &mut out, segment, dest)?;
            offset += copied;

            if is_join {
                if let Some(ending) = collapsed {
                    debug!(index = segment.index, offset, ending = %ending, "collapsed doubled terminator");
                }
                joins.push(JoinPoint {
                    after_segment: segment.index,
                    offset,
                    collapsed,
                });
            }
        }

        out.flush().map_err(write_err)?;

        let reassembly = Reassembly {
            path: dest.to_path_buf(),
            bytes_written: offset,
            joins,
        };
        info!(
            dest = %dest.display(),
            segments = segments.len(),
            bytes = offset,
            collapsed = reassembly.collapsed_count(),
            "reassembly complete"
        );
        Ok(reassembly)
    }
}

/// Read the last few bytes of `file`, then rewind it.
fn read_tail(file: &mut File, len: u64) -> std::io::Result<Vec<u8>> {
    let take = len.min(BoundaryNormalizer::TAIL_LEN as u64);
    file.seek(SeekFrom::Start(len - take))?;
    let mut tail = vec![0u8; take as usize];
    file.read_exact(&mut tail)?;
    file.seek(SeekFrom::Start(0))?;
    Ok(tail)
}

/// Stream the first `keep` bytes of `input` into `out`.
fn copy_prefix(
    input: File,
    keep: u64,
    out: &mut BufWriter<File>,
    segment: &Segment,
    dest: &Path,
) -> JoinResult<u64> {
    let mut reader = BufReader::new(input.take(keep));
    let mut copied = 0u64;
    loop {
        let chunk = reader.fill_buf().map_err(|source| JoinError::SegmentRead {
            index: segment.index,
            path: segment.path.clone(),
            source,
        })?;
        if chunk.is_empty() {
            break;
        }
        out.write_all(chunk)
            .map_err(|source| JoinError::DestinationWrite {
                path: dest.to_path_buf(),
                source,
            })?;
        let n = chunk.len();
        reader.consume(n);
        copied += n as u64;
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linesplit_split::LineSplitter;
    use std::fs;

    fn split(dir: &Path, data: &[u8], max_lines: u64) -> Vec<Segment> {
        let source = dir.join("original");
        fs::write(&source, data).unwrap();
        LineSplitter::new(max_lines)
            .unwrap()
            .split(&source, dir)
            .unwrap()
            .segments
    }

    fn append(path: &Path, bytes: &[u8]) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(bytes).unwrap();
    }

    #[test]
    fn clean_segments_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let data = b"a\nb\nc\nd\ne\n";
        let segments = split(dir.path(), data, 2);
        let dest = dir.path().join("verify");

        let out = Reassembler::default().reassemble(&segments, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), data);
        assert_eq!(out.bytes_written, data.len() as u64);
        assert_eq!(out.joins.len(), 2);
        assert_eq!(out.joins[0].offset, 4);
        assert_eq!(out.collapsed_count(), 0);
    }

    #[test]
    fn blank_line_on_boundary_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        // Segment 0 ends "b\n", segment 1 starts with a blank line.
        let data = b"a\nb\n\nc\n";
        let segments = split(dir.path(), data, 2);
        let dest = dir.path().join("verify");

        Reassembler::default().reassemble(&segments, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), data);
    }

    #[test]
    fn injected_terminator_is_collapsed_per_style() {
        for (data, extra) in [
            (&b"a\nb\nc\n"[..], &b"\n"[..]),
            (&b"a\r\nb\r\nc\r\n"[..], &b"\r\n"[..]),
            (&b"a\rb\rc\r"[..], &b"\r"[..]),
        ] {
            let dir = tempfile::tempdir().unwrap();
            let segments = split(dir.path(), data, 1);
            append(&segments[0].path, extra);
            append(&segments[1].path, extra);
            let dest = dir.path().join("verify");

            let out = Reassembler::default().reassemble(&segments, &dest).unwrap();
            assert_eq!(fs::read(&dest).unwrap(), data);
            assert_eq!(out.collapsed_count(), 2);
        }
    }

    #[test]
    fn final_segment_is_never_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let segments = split(dir.path(), b"a\nb\n", 1);
        append(&segments[1].path, b"\n");
        let dest = dir.path().join("verify");

        let out = Reassembler::default().reassemble(&segments, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"a\nb\n\n");
        assert_eq!(out.collapsed_count(), 0);
    }

    #[test]
    fn verbatim_keeps_injected_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let segments = split(dir.path(), b"a\nb\n", 1);
        append(&segments[0].path, b"\n");
        let dest = dir.path().join("verify");

        Reassembler::new(BoundaryNormalizer::Verbatim)
            .reassemble(&segments, &dest)
            .unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"a\n\nb\n");
    }

    #[test]
    fn caller_order_is_authoritative() {
        let dir = tempfile::tempdir().unwrap();
        let mut segments = split(dir.path(), b"1\n2\n3\n", 1);
        segments.reverse();
        let dest = dir.path().join("verify");

        Reassembler::default().reassemble(&segments, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"3\n2\n1\n");
    }

    #[test]
    fn no_segments_gives_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("verify");
        let out = Reassembler::default().reassemble(&[], &dest).unwrap();
        assert_eq!(out.bytes_written, 0);
        assert!(out.joins.is_empty());
        assert_eq!(fs::read(&dest).unwrap(), b"");
    }

    #[test]
    fn missing_segment_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let segments = split(dir.path(), b"a\nb\n", 1);
        fs::remove_file(&segments[1].path).unwrap();
        let err = Reassembler::default()
            .reassemble(&segments, &dir.path().join("verify"))
            .unwrap_err();
        assert!(matches!(err, JoinError::SegmentRead { index: 1, .. }));
    }

    #[test]
    fn existing_destination_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let segments = split(dir.path(), b"a\n", 1);
        let dest = dir.path().join("verify");
        fs::write(&dest, b"old").unwrap();
        let err = Reassembler::default().reassemble(&segments, &dest).unwrap_err();
        assert!(matches!(err, JoinError::DestinationWrite { .. }));
        assert_eq!(fs::read(&dest).unwrap(), b"old");
    }
}
