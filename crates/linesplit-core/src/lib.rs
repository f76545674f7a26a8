//! Line model shared by every linesplit crate.
//!
//! A *line* is a run of bytes ending in `\r\n`, `\n`, or a lone `\r`; the
//! terminator bytes stay attached to the line so that concatenating lines
//! reproduces the input byte-for-byte. The final line of a file may carry no
//! terminator at all.
//!
//! # Key Types
//!
//! - [`LineEnding`] -- The three recognized terminator styles
//! - [`LineReader`] -- Streaming reader yielding raw lines with terminators
//! - [`Segment`] -- One materialized chunk of a split source file
//! - [`SplitManifest`] -- Ordered segment list persisted next to the segments

pub mod ending;
pub mod error;
pub mod reader;
pub mod segment;

pub use ending::{is_blank, strip_terminator, LineEnding};
pub use error::{CoreError, CoreResult};
pub use reader::LineReader;
pub use segment::{Segment, SplitManifest, SEGMENT_PREFIX};
