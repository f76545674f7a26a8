//! Lazy, streaming line audit.
//!
//! Both readers advance together while their lines agree. At the first
//! divergence a window of up to `window` lines is read from each side and
//! aligned with Myers' algorithm; events are emitted up to the point where
//! the two sides line up again, and the unconsumed lines go back to the
//! front of their queues. Memory is bounded by the window, not the file.

use std::collections::VecDeque;
use std::io::{self, BufRead};

use linesplit_core::LineReader;
use similar::{capture_diff_slices, Algorithm, DiffOp};

use crate::event::{AuditEvent, NumberedLine};

/// Default lookahead, in lines per side, used when streams diverge.
pub const DEFAULT_WINDOW: usize = 512;

/// One input stream with a pushback queue for lines returned by a resync.
struct Side<R> {
    reader: LineReader<R>,
    pushback: VecDeque<NumberedLine>,
    lines_read: u64,
    eof: bool,
}

impl<R: BufRead> Side<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: LineReader::new(inner),
            pushback: VecDeque::new(),
            lines_read: 0,
            eof: false,
        }
    }

    fn pull(&mut self) -> io::Result<Option<NumberedLine>> {
        if let Some(line) = self.pushback.pop_front() {
            return Ok(Some(line));
        }
        if self.eof {
            return Ok(None);
        }
        match self.reader.next_line()? {
            Some(bytes) => {
                self.lines_read += 1;
                Ok(Some(NumberedLine::new(self.lines_read, bytes)))
            }
            None => {
                self.eof = true;
                Ok(None)
            }
        }
    }

    fn fill(&mut self, first: NumberedLine, limit: usize) -> io::Result<Vec<NumberedLine>> {
        let mut window = vec![first];
        while window.len() < limit {
            match self.pull()? {
                Some(line) => window.push(line),
                None => break,
            }
        }
        Ok(window)
    }

    /// Every line of this stream has been handed out.
    fn exhausted(&self) -> bool {
        self.eof && self.pushback.is_empty()
    }

    fn unread(&mut self, rest: impl DoubleEndedIterator<Item = NumberedLine>) {
        for line in rest.rev() {
            self.pushback.push_front(line);
        }
    }
}

/// Iterator of [`AuditEvent`]s comparing an original and a reconstructed stream.
///
/// Every line of both inputs appears in exactly one event, and events come
/// out in input order. Identical inputs always yield the same sequence.
pub struct AuditStream<A, B> {
    original: Side<A>,
    reconstructed: Side<B>,
    window: usize,
    queued: VecDeque<AuditEvent>,
    /// A line past the end of the other stream has already been emitted.
    past_end: bool,
    finished: bool,
}

impl<A: BufRead, B: BufRead> AuditStream<A, B> {
    /// Compare `original` against `reconstructed`, buffering at most
    /// `window` lines per side on divergence (minimum 1).
    pub fn new(original: A, reconstructed: B, window: usize) -> Self {
        Self {
            original: Side::new(original),
            reconstructed: Side::new(reconstructed),
            window: window.max(1),
            queued: VecDeque::new(),
            past_end: false,
            finished: false,
        }
    }

    /// Lines consumed so far from (original, reconstructed).
    pub fn lines_read(&self) -> (u64, u64) {
        (self.original.lines_read, self.reconstructed.lines_read)
    }

    /// True only for the first leftover line once the other side is done.
    fn first_past_end(&mut self, other_done: bool) -> bool {
        if !other_done || self.past_end {
            return false;
        }
        self.past_end = true;
        true
    }

    fn advance(&mut self) -> io::Result<()> {
        let a = self.original.pull()?;
        let b = self.reconstructed.pull()?;
        match (a, b) {
            (None, None) => self.finished = true,
            (Some(a), None) => {
                let stream_end = self.first_past_end(true);
                self.queued.push_back(AuditEvent::MissingInReconstructed {
                    original: a,
                    stream_end,
                });
            }
            (None, Some(b)) => {
                let stream_end = self.first_past_end(true);
                self.queued.push_back(AuditEvent::MissingInOriginal {
                    reconstructed: b,
                    stream_end,
                });
            }
            (Some(a), Some(b)) if a.bytes == b.bytes => self.queued.push_back(AuditEvent::Match {
                original: a,
                reconstructed_number: b.number,
            }),
            (Some(a), Some(b)) => self.resync(a, b)?,
        }
        Ok(())
    }

    fn resync(&mut self, a: NumberedLine, b: NumberedLine) -> io::Result<()> {
        let window_a = self.original.fill(a, self.window)?;
        let window_b = self.reconstructed.fill(b, self.window)?;
        let a_done = self.original.exhausted();
        let b_done = self.reconstructed.exhausted();

        let ops = {
            let keys_a: Vec<&[u8]> = window_a.iter().map(|l| l.bytes.as_slice()).collect();
            let keys_b: Vec<&[u8]> = window_b.iter().map(|l| l.bytes.as_slice()).collect();
            capture_diff_slices(Algorithm::Myers, &keys_a, &keys_b)
        };

        // Everything before the first equal run is the divergent stretch.
        let (mut deleted, mut inserted) = (0usize, 0usize);
        for op in ops {
            match op {
                DiffOp::Equal { .. } => break,
                DiffOp::Delete { old_len, .. } => deleted += old_len,
                DiffOp::Insert { new_len, .. } => inserted += new_len,
                DiffOp::Replace {
                    old_len, new_len, ..
                } => {
                    deleted += old_len;
                    inserted += new_len;
                }
            }
        }

        let (total_a, total_b) = (window_a.len(), window_b.len());
        let (mut used_a, mut used_b) = (0usize, 0usize);
        let mut lines_a = window_a.into_iter();
        let mut lines_b = window_b.into_iter();

        let paired = deleted.min(inserted);
        for (original, reconstructed) in lines_a.by_ref().zip(lines_b.by_ref()).take(paired) {
            used_a += 1;
            used_b += 1;
            self.queued.push_back(AuditEvent::Mismatch {
                original,
                reconstructed,
            });
        }
        for original in lines_a.by_ref().take(deleted - paired) {
            used_a += 1;
            let stream_end = self.first_past_end(b_done && used_b == total_b);
            self.queued.push_back(AuditEvent::MissingInReconstructed {
                original,
                stream_end,
            });
        }
        for reconstructed in lines_b.by_ref().take(inserted - paired) {
            let stream_end = self.first_past_end(a_done && used_a == total_a);
            self.queued.push_back(AuditEvent::MissingInOriginal {
                reconstructed,
                stream_end,
            });
        }

        self.original.unread(lines_a);
        self.reconstructed.unread(lines_b);
        Ok(())
    }
}

impl<A: BufRead, B: BufRead> Iterator for AuditStream<A, B> {
    type Item = io::Result<AuditEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            if let Err(e) = self.advance() {
                self.finished = true;
                return Some(Err(e));
            }
        }
    }
}
