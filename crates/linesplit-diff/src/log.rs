//! Audit log format.
//!
//! One line per event, in stream order, followed by a single summary line:
//!
//! ```text
//! MATCH: a=1 b=1 "first\n"
//! MISMATCH: a=2 b=2 "old\n" | "new\n"
//! MISSING_IN_ORIGINAL: b=3 ignored "\n"
//! SUMMARY: events=3 errors=1
//! ```
//!
//! Line text is written as an escaped, quoted string so every event stays on
//! one physical line whatever its terminator.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auditor::AuditTally;
use crate::error::{DiffError, DiffResult};
use crate::event::AuditOutcome;

const SUMMARY_LABEL: &str = "SUMMARY";
const IGNORED_FLAG: &str = "ignored";

/// Totals recovered from a persisted audit log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogSummary {
    pub tally: AuditTally,
    pub error_count: u64,
}

/// Reader and formatter for audit log files.
pub struct AuditLog;

impl AuditLog {
    /// The closing line of every complete log.
    pub fn summary_line(tally: &AuditTally) -> String {
        format!(
            "{SUMMARY_LABEL}: events={} errors={}",
            tally.events(),
            tally.error_count()
        )
    }

    /// Parse a log written by the auditor and check it against its summary.
    ///
    /// Fails if a line does not parse, line numbers skip or repeat, the
    /// summary line is missing or followed by more content, or the summary
    /// disagrees with the events above it.
    pub fn read(path: &Path) -> DiffResult<AuditLogSummary> {
        let read_err = |source| DiffError::LogRead {
            path: path.to_path_buf(),
            source,
        };
        let corrupt = |line: usize, reason: String| DiffError::LogCorrupt {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let reader = BufReader::new(File::open(path).map_err(read_err)?);
        let mut tally = AuditTally::default();
        let mut next_a = 1u64;
        let mut next_b = 1u64;
        let mut summary: Option<(u64, u64)> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(read_err)?;
            let line_no = idx + 1;

            if summary.is_some() {
                return Err(corrupt(line_no, "content after summary line".into()));
            }

            let (label, rest) = line
                .split_once(": ")
                .ok_or_else(|| corrupt(line_no, "missing label".into()))?;

            if label == SUMMARY_LABEL {
                summary = Some(parse_summary(rest).map_err(|r| corrupt(line_no, r))?);
                continue;
            }

            let outcome = AuditOutcome::from_label(label)
                .ok_or_else(|| corrupt(line_no, format!("unknown label {label:?}")))?;
            let parsed = parse_event(outcome, rest).map_err(|r| corrupt(line_no, r))?;

            for (side, number, expected) in [("a", parsed.a, &mut next_a), ("b", parsed.b, &mut next_b)] {
                if let Some(number) = number {
                    if number != *expected {
                        return Err(corrupt(
                            line_no,
                            format!("expected {side}={expected}, found {side}={number}"),
                        ));
                    }
                    *expected += 1;
                }
            }
            tally.record_outcome(outcome, parsed.ignored);
        }

        let (recorded_events, recorded_errors) = summary.ok_or_else(|| DiffError::LogTruncated {
            path: path.to_path_buf(),
        })?;
        let (counted_events, counted_errors) = (tally.events(), tally.error_count());
        if recorded_events != counted_events || recorded_errors != counted_errors {
            return Err(DiffError::LogSummaryMismatch {
                path: path.to_path_buf(),
                recorded_events,
                recorded_errors,
                counted_events,
                counted_errors,
            });
        }

        Ok(AuditLogSummary {
            tally,
            error_count: counted_errors,
        })
    }
}

struct ParsedEvent {
    a: Option<u64>,
    b: Option<u64>,
    ignored: bool,
}

fn parse_summary(rest: &str) -> Result<(u64, u64), String> {
    let mut parts = rest.split(' ');
    let events = numbered_token(parts.next(), "events")?;
    let errors = numbered_token(parts.next(), "errors")?;
    if parts.next().is_some() {
        return Err("trailing data in summary".into());
    }
    Ok((events, errors))
}

fn parse_event(outcome: AuditOutcome, rest: &str) -> Result<ParsedEvent, String> {
    let mut rest = rest;
    let mut take_number = |key: &str| -> Result<u64, String> {
        let (token, tail) = rest
            .split_once(' ')
            .ok_or_else(|| format!("missing {key}= field"))?;
        rest = tail;
        numbered_token(Some(token), key)
    };

    let (a, b) = match outcome {
        AuditOutcome::Match | AuditOutcome::Mismatch => {
            (Some(take_number("a")?), Some(take_number("b")?))
        }
        AuditOutcome::MissingInReconstructed => (Some(take_number("a")?), None),
        AuditOutcome::MissingInOriginal => (None, Some(take_number("b")?)),
    };

    let (ignored, text) = match rest.strip_prefix(IGNORED_FLAG) {
        Some(tail) => (
            true,
            tail.strip_prefix(' ')
                .ok_or_else(|| "malformed ignored flag".to_string())?,
        ),
        None => (false, rest),
    };
    if ignored && outcome == AuditOutcome::Match {
        return Err("match cannot be ignored".into());
    }

    let quoted = if outcome == AuditOutcome::Mismatch { 2 } else { 1 };
    check_quoted(text, quoted)?;
    Ok(ParsedEvent { a, b, ignored })
}

fn numbered_token(token: Option<&str>, key: &str) -> Result<u64, String> {
    token
        .and_then(|t| t.strip_prefix(key))
        .and_then(|t| t.strip_prefix('='))
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| format!("expected {key}=<number>"))
}

/// Check that `text` is `count` quoted strings separated by ` | `.
fn check_quoted(text: &str, count: usize) -> Result<(), String> {
    let mut rest = text;
    for n in 0..count {
        if n > 0 {
            rest = rest
                .strip_prefix(" | ")
                .ok_or_else(|| "missing separator between lines".to_string())?;
        }
        rest = rest
            .strip_prefix('"')
            .ok_or_else(|| "line text is not quoted".to_string())?;
        let end = closing_quote(rest).ok_or_else(|| "unterminated line text".to_string())?;
        rest = &rest[end + 1..];
    }
    if rest.is_empty() {
        Ok(())
    } else {
        Err("trailing data after line text".into())
    }
}

/// Byte offset of the first unescaped `"` in `s`.
fn closing_quote(s: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}
