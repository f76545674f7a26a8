//! Differential audit for linesplit.
//!
//! Compares an original file with its reassembled copy line by line and
//! classifies every line of both inputs exactly once. The comparison is
//! streaming: both inputs advance in lockstep while they agree, and only a
//! bounded lookahead window is buffered when they diverge. The window is
//! aligned with the `similar` crate (Myers diff).
//!
//! # Key Types
//!
//! - [`AuditStream`] -- Lazy iterator of [`AuditEvent`]s over two readers
//! - [`DiffAuditor`] / [`AuditResult`] -- File-level audit writing an audit log
//! - [`AuditLog`] -- Parser for persisted audit logs

pub mod auditor;
pub mod error;
pub mod event;
pub mod log;
pub mod stream;

pub use auditor::{AuditResult, AuditTally, DiffAuditor};
pub use error::{DiffError, DiffResult};
pub use event::{AuditEvent, AuditOutcome, NumberedLine};
pub use log::{AuditLog, AuditLogSummary};
pub use stream::{AuditStream, DEFAULT_WINDOW};
