//! File lifecycle states and per-stage timing records.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle state of one source file.
///
/// Files move forward through the stages in order and end in either
/// [`FileState::Reported`] or [`FileState::Failed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Staging,
    Splitting,
    Reassembling,
    Auditing,
    Reported,
    Failed,
}

impl FileState {
    /// The state that follows a successful stage, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Staging => Some(Self::Splitting),
            Self::Splitting => Some(Self::Reassembling),
            Self::Reassembling => Some(Self::Auditing),
            Self::Auditing => Some(Self::Reported),
            Self::Reported | Self::Failed => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "STAGING",
            Self::Splitting => "SPLITTING",
            Self::Reassembling => "REASSEMBLING",
            Self::Auditing => "AUDITING",
            Self::Reported => "REPORTED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and result of one completed stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: FileState,
    pub elapsed: Duration,
    pub ok: bool,
}
