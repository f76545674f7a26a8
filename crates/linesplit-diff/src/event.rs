//! Audit events and their log-line rendering.

use std::fmt;

use linesplit_core::is_blank;
use serde::{Deserialize, Serialize};

/// A raw line together with its 1-based position in its stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberedLine {
    pub number: u64,
    pub bytes: Vec<u8>,
}

impl NumberedLine {
    /// Pair `bytes`, terminator included, with its line number.
    pub fn new(number: u64, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            number,
            bytes: bytes.into(),
        }
    }
}

/// Classification of a single audit event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    /// Same line on both sides.
    Match,
    /// Aligned lines that differ.
    Mismatch,
    /// Present only in the reconstructed stream.
    MissingInOriginal,
    /// Present only in the original stream.
    MissingInReconstructed,
}

impl AuditOutcome {
    pub const ALL: [AuditOutcome; 4] = [
        AuditOutcome::Match,
        AuditOutcome::Mismatch,
        AuditOutcome::MissingInOriginal,
        AuditOutcome::MissingInReconstructed,
    ];

    /// Label written at the start of each audit log line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Match => "MATCH",
            Self::Mismatch => "MISMATCH",
            Self::MissingInOriginal => "MISSING_IN_ORIGINAL",
            Self::MissingInReconstructed => "MISSING_IN_RECONSTRUCTED",
        }
    }

    /// Inverse of [`AuditOutcome::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.label() == label)
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One classified outcome of comparing the original and reconstructed streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuditEvent {
    /// Identical bytes on both sides; the line text is kept once.
    Match {
        original: NumberedLine,
        reconstructed_number: u64,
    },
    /// Two aligned lines whose bytes differ.
    Mismatch {
        original: NumberedLine,
        reconstructed: NumberedLine,
    },
    /// A reconstructed line with no counterpart in the original.
    MissingInOriginal {
        reconstructed: NumberedLine,
        /// First line left over after the original stream ended.
        stream_end: bool,
    },
    /// An original line with no counterpart in the reconstruction.
    MissingInReconstructed {
        original: NumberedLine,
        /// First line left over after the reconstructed stream ended.
        stream_end: bool,
    },
}

impl AuditEvent {
    pub fn outcome(&self) -> AuditOutcome {
        match self {
            Self::Match { .. } => AuditOutcome::Match,
            Self::Mismatch { .. } => AuditOutcome::Mismatch,
            Self::MissingInOriginal { .. } => AuditOutcome::MissingInOriginal,
            Self::MissingInReconstructed { .. } => AuditOutcome::MissingInReconstructed,
        }
    }

    /// A non-match event that carries no real divergence: two blank lines
    /// compared against each other, or a blank line that is the first one
    /// left over once the other stream has ended. Any further leftover
    /// lines, blank or not, are errors.
    pub fn is_ignored(&self) -> bool {
        match self {
            Self::Match { .. } => false,
            Self::Mismatch {
                original,
                reconstructed,
            } => is_blank(&original.bytes) && is_blank(&reconstructed.bytes),
            Self::MissingInOriginal {
                reconstructed: line,
                stream_end,
            }
            | Self::MissingInReconstructed {
                original: line,
                stream_end,
            } => *stream_end && is_blank(&line.bytes),
        }
    }

    /// Whether this event counts toward the audit error count.
    pub fn is_error(&self) -> bool {
        self.outcome() != AuditOutcome::Match && !self.is_ignored()
    }
}

/// Renders the audit log line, e.g. `MISMATCH: a=5 b=5 "old\n" | "new\n"`.
impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = if self.is_ignored() { " ignored" } else { "" };
        write!(f, "{}: ", self.outcome())?;
        match self {
            Self::Match {
                original,
                reconstructed_number,
            } => write!(
                f,
                "a={} b={} {:?}",
                original.number,
                reconstructed_number,
                String::from_utf8_lossy(&original.bytes)
            ),
            Self::Mismatch {
                original,
                reconstructed,
            } => write!(
                f,
                "a={} b={}{flag} {:?} | {:?}",
                original.number,
                reconstructed.number,
                String::from_utf8_lossy(&original.bytes),
                String::from_utf8_lossy(&reconstructed.bytes)
            ),
            Self::MissingInOriginal { reconstructed, .. } => write!(
                f,
                "b={}{flag} {:?}",
                reconstructed.number,
                String::from_utf8_lossy(&reconstructed.bytes)
            ),
            Self::MissingInReconstructed { original, .. } => write!(
                f,
                "a={}{flag} {:?}",
                original.number,
                String::from_utf8_lossy(&original.bytes)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_roundtrip() {
        for outcome in AuditOutcome::ALL {
            assert_eq!(AuditOutcome::from_label(outcome.label()), Some(outcome));
        }
        assert_eq!(AuditOutcome::from_label("SUMMARY"), None);
    }

    #[test]
    fn match_renders_both_numbers() {
        let event = AuditEvent::Match {
            original: NumberedLine::new(3, "hello\n"),
            reconstructed_number: 4,
        };
        assert_eq!(event.to_string(), r#"MATCH: a=3 b=4 "hello\n""#);
        assert!(!event.is_error());
    }

    #[test]
    fn mismatch_renders_both_lines() {
        let event = AuditEvent::Mismatch {
            original: NumberedLine::new(5, "old\r\n"),
            reconstructed: NumberedLine::new(5, "new\r\n"),
        };
        assert_eq!(event.to_string(), r#"MISMATCH: a=5 b=5 "old\r\n" | "new\r\n""#);
        assert!(event.is_error());
    }

    #[test]
    fn blank_mismatch_is_ignored() {
        let event = AuditEvent::Mismatch {
            original: NumberedLine::new(9, "\n"),
            reconstructed: NumberedLine::new(9, "\r\n"),
        };
        assert!(event.is_ignored());
        assert!(!event.is_error());
        assert_eq!(event.to_string(), r#"MISMATCH: a=9 b=9 ignored "\n" | "\r\n""#);
    }

    #[test]
    fn trailing_blank_missing_is_ignored() {
        let trailing = AuditEvent::MissingInReconstructed {
            original: NumberedLine::new(10, "\n"),
            stream_end: true,
        };
        assert!(!trailing.is_error());

        // A blank line dropped mid-stream is a real divergence.
        let inner = AuditEvent::MissingInReconstructed {
            original: NumberedLine::new(4, "\n"),
            stream_end: false,
        };
        assert!(inner.is_error());

        let trailing_text = AuditEvent::MissingInOriginal {
            reconstructed: NumberedLine::new(10, "extra\n"),
            stream_end: true,
        };
        assert!(trailing_text.is_error());
        assert_eq!(trailing_text.to_string(), r#"MISSING_IN_ORIGINAL: b=10 "extra\n""#);
    }

    #[test]
    fn quotes_are_escaped() {
        let event = AuditEvent::MissingInReconstructed {
            original: NumberedLine::new(1, "say \"hi\"\n"),
            stream_end: false,
        };
        assert_eq!(
            event.to_string(),
            r#"MISSING_IN_RECONSTRUCTED: a=1 "say \"hi\"\n""#
        );
    }
}
