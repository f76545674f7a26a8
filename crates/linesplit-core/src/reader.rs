//! Streaming line reader that keeps terminator bytes.
//!
//! `BufRead::read_until(b'\n')` cannot see lone `\r` terminators, so this
//! reader scans for either byte and resolves a `\r` that falls on a buffer
//! boundary by peeking at the next fill.

use std::io::{self, BufRead};

/// Reads raw lines, each including its original terminator.
pub struct LineReader<R> {
    inner: R,
    /// A `\r` ended the previous fill; the next byte decides CR vs CRLF.
    pending_cr: bool,
}

impl<R: BufRead> LineReader<R> {
    /// Wrap a buffered reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pending_cr: false,
        }
    }

    /// Append the next line (terminator included) to `buf`.
    ///
    /// Returns the number of bytes appended; `0` means end of input.
    pub fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<usize> {
        let start = buf.len();
        loop {
            let (done, used) = {
                let available = match self.inner.fill_buf() {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };

                if available.is_empty() {
                    self.pending_cr = false;
                    return Ok(buf.len() - start);
                }

                if self.pending_cr {
                    self.pending_cr = false;
                    if available[0] == b'\n' {
                        buf.push(b'\n');
                        (true, 1)
                    } else {
                        // Lone CR; the byte belongs to the next line.
                        return Ok(buf.len() - start);
                    }
                } else {
                    match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                        Some(i) if available[i] == b'\n' => {
                            buf.extend_from_slice(&available[..=i]);
                            (true, i + 1)
                        }
                        Some(i) if i + 1 < available.len() => {
                            let end = if available[i + 1] == b'\n' { i + 2 } else { i + 1 };
                            buf.extend_from_slice(&available[..end]);
                            (true, end)
                        }
                        Some(i) => {
                            buf.extend_from_slice(&available[..=i]);
                            self.pending_cr = true;
                            (false, i + 1)
                        }
                        None => {
                            buf.extend_from_slice(available);
                            (false, available.len())
                        }
                    }
                }
            };

            self.inner.consume(used);
            if done {
                return Ok(buf.len() - start);
            }
        }
    }

    /// Read the next line into a fresh buffer, or `None` at end of input.
    pub fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        match self.read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    fn lines(data: &[u8]) -> Vec<Vec<u8>> {
        LineReader::new(Cursor::new(data.to_vec()))
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    /// Forces tiny fills so terminators straddle buffer boundaries.
    fn lines_with_capacity(data: &[u8], capacity: usize) -> Vec<Vec<u8>> {
        let reader = BufReader::with_capacity(capacity, Cursor::new(data.to_vec()));
        LineReader::new(reader)
            .collect::<io::Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn empty_input_has_no_lines() {
        assert!(lines(b"").is_empty());
    }

    #[test]
    fn lf_lines_keep_terminators() {
        assert_eq!(lines(b"a\nb\n"), vec![b"a\n".to_vec(), b"b\n".to_vec()]);
    }

    #[test]
    fn final_line_without_terminator() {
        assert_eq!(lines(b"a\nb"), vec![b"a\n".to_vec(), b"b".to_vec()]);
    }

    #[test]
    fn crlf_and_lone_cr() {
        assert_eq!(
            lines(b"a\r\nb\rc\n\r\n"),
            vec![
                b"a\r\n".to_vec(),
                b"b\r".to_vec(),
                b"c\n".to_vec(),
                b"\r\n".to_vec()
            ]
        );
    }

    #[test]
    fn blank_lines_are_lines() {
        assert_eq!(
            lines(b"\n\nx\n"),
            vec![b"\n".to_vec(), b"\n".to_vec(), b"x\n".to_vec()]
        );
    }

    #[test]
    fn cr_on_buffer_boundary() {
        let data = b"ab\r\ncd\ref\r";
        for capacity in 1..8 {
            assert_eq!(
                lines_with_capacity(data, capacity),
                vec![b"ab\r\n".to_vec(), b"cd\r".to_vec(), b"ef\r".to_vec()],
                "capacity {capacity}"
            );
        }
    }

    #[test]
    fn concatenation_reproduces_input() {
        let data = b"one\r\ntwo\nthree\rfour\r\n\r\nfive";
        let joined: Vec<u8> = lines_with_capacity(data, 3).concat();
        assert_eq!(joined, data);
    }
}
