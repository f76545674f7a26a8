//! Line splitter for linesplit.
//!
//! Reads a source file one line at a time and writes consecutive runs of at
//! most `max_lines` lines into numbered segment files. Terminator bytes are
//! copied verbatim, so concatenating the segments in manifest order yields
//! the source byte-for-byte.
//!
//! - **LineSplitter**: runs the split and returns a [`SplitManifest`]
//! - **SplitError**: open/read/write failures, naming the last completed segment

pub mod error;
pub mod splitter;

pub use error::{SplitError, SplitResult};
pub use linesplit_core::{Segment, SplitManifest};
pub use splitter::LineSplitter;
