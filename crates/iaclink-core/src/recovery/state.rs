use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecoveryMode {
    #[default]
    Normal,
    InRecovery,
}

/// Byte range of the input discarded by a recovery strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRange {
    pub start: usize,
    pub end: usize,
    pub reason: String,
}

/// Offset where scanning resumed after an error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryPoint {
    pub offset: usize,
    pub strategy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryState {
    pub error_count: usize,
    /// Attempts spent on the error currently being recovered from
    pub recovery_attempts: usize,
    pub total_attempts: usize,
    pub skipped_ranges: Vec<SkippedRange>,
    pub recovery_points: Vec<RecoveryPoint>,
    pub mode: RecoveryMode,
}

impl RecoveryState {
    pub fn is_recovering(&self) -> bool {
        self.mode == RecoveryMode::InRecovery
    }

    pub fn skipped_bytes(&self) -> usize {
        self.skipped_ranges.iter().map(|r| r.end.saturating_sub(r.start)).sum()
    }

    pub fn reset(&mut self) {
        *self = RecoveryState::default();
    }
}
