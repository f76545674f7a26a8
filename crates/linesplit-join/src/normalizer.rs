//! Join-point boundary normalization.
//!
//! A segment that was rewritten after the split (an editor or transfer tool
//! appending a newline, for instance) can end with one terminator more than
//! the splitter wrote. Concatenated naively, that extra terminator shows up
//! as a spurious blank line at the join. The recorded segment length is the
//! authority: only bytes beyond it are ever candidates for removal.

use linesplit_core::LineEnding;
use serde::{Deserialize, Serialize};

/// How segment boundaries are treated during reassembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryNormalizer {
    /// Copy every byte of every segment.
    Verbatim,
    /// Drop one trailing terminator at a join when the segment file holds
    /// exactly one terminator more than was recorded and ends in a doubled
    /// terminator of the same style.
    #[default]
    CollapseDoubled,
}

impl BoundaryNormalizer {
    /// Number of tail bytes [`Self::collapse_at_join`] needs to inspect.
    pub const TAIL_LEN: usize = 4;

    /// Decide whether the tail of a segment at a join carries an injected
    /// terminator. Returns the style to drop, if any.
    ///
    /// `tail` holds the last (up to [`Self::TAIL_LEN`]) bytes of the file.
    /// Styles are tried CRLF first so `\r\n\r\n` is never read as `\n` + `\r\n`.
    pub fn collapse_at_join(
        &self,
        recorded_len: u64,
        actual_len: u64,
        tail: &[u8],
    ) -> Option<LineEnding> {
        match self {
            Self::Verbatim => None,
            Self::CollapseDoubled => LineEnding::ALL.into_iter().find(|ending| {
                actual_len == recorded_len + ending.len() as u64 && tail.ends_with(ending.doubled())
            }),
        }
    }
}
