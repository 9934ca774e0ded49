use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On-disk shape of the history file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub commands: Vec<String>,
    /// ISO-8601 time of the last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed history file: {0}")]
    Format(#[from] serde_json::Error),
}

/// What happened to the durable copy after a mutation.
///
/// Persistence failures never reach the user; the in-memory history keeps
/// working. The outcome is returned so callers and tests can still see it.
#[derive(Debug)]
#[must_use]
pub enum PersistOutcome {
    /// Nothing changed, nothing was written.
    Skipped,
    /// Memory only, no store configured.
    NotPersisted,
    Saved,
    Failed(HistoryError),
}

impl PersistOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PersistOutcome::Failed(_))
    }
}
