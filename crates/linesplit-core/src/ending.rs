//! Line terminator styles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A recognized line terminator style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\r\n` (Windows).
    CrLf,
    /// `\n` (Unix).
    Lf,
    /// A lone `\r` (classic Mac).
    Cr,
}

impl LineEnding {
    /// All styles, longest first. Matching must try `CrLf` before `Cr`.
    pub const ALL: [LineEnding; 3] = [LineEnding::CrLf, LineEnding::Lf, LineEnding::Cr];

    /// The terminator bytes.
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::CrLf => b"\r\n",
            Self::Lf => b"\n",
            Self::Cr => b"\r",
        }
    }

    /// Length of the terminator in bytes.
    pub fn len(self) -> usize {
        self.as_bytes().len()
    }

    /// The terminator repeated twice, e.g. `\r\n\r\n`.
    pub fn doubled(self) -> &'static [u8] {
        match self {
            Self::CrLf => b"\r\n\r\n",
            Self::Lf => b"\n\n",
            Self::Cr => b"\r\r",
        }
    }

    /// The terminator a raw line ends with, if any.
    pub fn of_line(line: &[u8]) -> Option<Self> {
        if line.ends_with(b"\r\n") {
            Some(Self::CrLf)
        } else if line.ends_with(b"\n") {
            Some(Self::Lf)
        } else if line.ends_with(b"\r") {
            Some(Self::Cr)
        } else {
            None
        }
    }

    /// Short uppercase name used in logs and reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::CrLf => "CRLF",
            Self::Lf => "LF",
            Self::Cr => "CR",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The line content without its terminator.
pub fn strip_terminator(line: &[u8]) -> &[u8] {
    match LineEnding::of_line(line) {
        Some(ending) => &line[..line.len() - ending.len()],
        None => line,
    }
}

/// Returns `true` if the line holds nothing but (at most) a terminator.
pub fn is_blank(line: &[u8]) -> bool {
    strip_terminator(line).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_line_prefers_crlf() {
        assert_eq!(LineEnding::of_line(b"abc\r\n"), Some(LineEnding::CrLf));
        assert_eq!(LineEnding::of_line(b"abc\n"), Some(LineEnding::Lf));
        assert_eq!(LineEnding::of_line(b"abc\r"), Some(LineEnding::Cr));
        assert_eq!(LineEnding::of_line(b"abc"), None);
    }

    #[test]
    fn strip_and_blank() {
        assert_eq!(strip_terminator(b"x\r\n"), b"x");
        assert_eq!(strip_terminator(b"x"), b"x");
        assert!(is_blank(b"\n"));
        assert!(is_blank(b"\r\n"));
        assert!(is_blank(b""));
        assert!(!is_blank(b" \n"));
    }

    #[test]
    fn doubled_is_two_terminators() {
        for ending in LineEnding::ALL {
            assert_eq!(ending.doubled().len(), ending.len() * 2);
            assert!(ending.doubled().starts_with(ending.as_bytes()));
            assert!(ending.doubled().ends_with(ending.as_bytes()));
        }
    }
}
