//! Segment reassembly for linesplit.
//!
//! Concatenates segment files in the order the caller supplies into a single
//! verification file. A [`BoundaryNormalizer`] may repair a duplicated line
//! terminator at a join point; it never looks inside segment content.
//!
//! # Key Types
//!
//! - [`Reassembler`] -- Streams segments into the destination file
//! - [`BoundaryNormalizer`] -- Join-point repair strategy
//! - [`Reassembly`] / [`JoinPoint`] -- What was written and where segments meet

pub mod error;
pub mod normalizer;
pub mod reassembler;

pub use error::{JoinError, JoinResult};
pub use normalizer::BoundaryNormalizer;
pub use reassembler::{JoinPoint, Reassembler, Reassembly};
