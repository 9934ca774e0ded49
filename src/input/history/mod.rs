mod file_ops;
pub mod types;

use std::path::{Path, PathBuf};

use log::{debug, warn};

use self::file_ops::FileOps;
pub use self::types::{HistoryError, HistoryRecord, PersistOutcome};

pub const DEFAULT_MAX_HISTORY: usize = 1000;

/// Chronological log of accepted command lines.
///
/// Consecutive duplicates are collapsed and only the newest `max_entries`
/// lines are kept. Every change is written straight through to the backing
/// file when one is configured.
#[derive(Debug)]
pub struct History {
    entries: Vec<String>,
    file_ops: Option<FileOps>,
    max_entries: usize,
}

impl History {
    /// Open the history stored at `history_file`. A missing or unreadable
    /// file starts an empty history.
    pub fn open(history_file: impl Into<PathBuf>, max_entries: usize) -> Self {
        let file_ops = FileOps::new(history_file.into());
        let entries = match file_ops.load_entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "ignoring unreadable history file {}: {}",
                    file_ops.path().display(),
                    e
                );
                Vec::new()
            }
        };

        let mut history = History {
            entries,
            file_ops: Some(file_ops),
            max_entries,
        };
        history.trim_entries();
        history
    }

    /// A history that is never written anywhere.
    pub fn in_memory(max_entries: usize) -> Self {
        History {
            entries: Vec::new(),
            file_ops: None,
            max_entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_ops.as_ref().map(FileOps::path)
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn add(&mut self, entry: &str) -> PersistOutcome {
        if entry.trim().is_empty() || self.entries.last().map(String::as_str) == Some(entry) {
            return PersistOutcome::Skipped;
        }

        self.entries.push(entry.to_owned());
        self.trim_entries();
        self.persist()
    }

    pub fn clear(&mut self) -> PersistOutcome {
        self.entries.clear();
        self.persist()
    }

    /// Every entry, oldest first.
    pub fn all(&self) -> &[String] {
        &self.entries
    }

    /// The last `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> &[String] {
        let start = self.entries.len().saturating_sub(count);
        &self.entries[start..]
    }

    /// Entries containing `pattern`, ignoring case, in their original order.
    pub fn search(&self, pattern: &str) -> Vec<&str> {
        let needle = pattern.to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn trim_entries(&mut self) {
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
    }

    fn persist(&self) -> PersistOutcome {
        let Some(file_ops) = &self.file_ops else {
            return PersistOutcome::NotPersisted;
        };

        match file_ops.save_entries(&self.entries) {
            Ok(()) => {
                debug!("history saved to {}", file_ops.path().display());
                PersistOutcome::Saved
            }
            Err(e) => {
                warn!(
                    "could not save history to {}: {}",
                    file_ops.path().display(),
                    e
                );
                PersistOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_skips_blank_and_adjacent_duplicates() {
        let mut history = History::in_memory(10);
        assert!(matches!(history.add("   "), PersistOutcome::Skipped));
        assert!(matches!(history.add("ls"), PersistOutcome::NotPersisted));
        assert!(matches!(history.add("ls"), PersistOutcome::Skipped));
        let _ = history.add("pwd");
        let _ = history.add("ls");
        assert_eq!(history.all(), ["ls", "pwd", "ls"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::in_memory(3);
        for cmd in ["a", "b", "c", "d", "e"] {
            let _ = history.add(cmd);
        }
        assert_eq!(history.all(), ["c", "d", "e"]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_recent() {
        let mut history = History::in_memory(10);
        for cmd in ["a", "b", "c"] {
            let _ = history.add(cmd);
        }
        assert_eq!(history.recent(2), ["b", "c"]);
        assert_eq!(history.recent(10), ["a", "b", "c"]);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn test_search_case_insensitive_in_order() {
        let mut history = History::in_memory(10);
        for cmd in ["ls -la", "cd /tmp", "LS docs", "pwd"] {
            let _ = history.add(cmd);
        }
        assert_eq!(history.search("ls"), vec!["ls -la", "LS docs"]);
        assert_eq!(history.search(""), vec!["ls -la", "cd /tmp", "LS docs", "pwd"]);
        assert!(history.search("nothing").is_empty());
    }

    #[test]
    fn test_persistence_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".termina_history");

        let mut history = History::open(&path, 100);
        for cmd in ["ls", "cd /tmp", "echo \"quoted\""] {
            assert!(matches!(history.add(cmd), PersistOutcome::Saved));
        }

        let reloaded = History::open(&path, 100);
        assert_eq!(reloaded.all(), history.all());
    }

    #[test]
    fn test_clear_persists_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hist");

        let mut history = History::open(&path, 100);
        let _ = history.add("ls");
        assert!(matches!(history.clear(), PersistOutcome::Saved));
        assert!(history.is_empty());
        assert!(History::open(&path, 100).is_empty());
    }

    #[test]
    fn test_corrupt_store_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hist");
        fs::write(&path, "{ broken").unwrap();

        let mut history = History::open(&path, 100);
        assert!(history.is_empty());
        assert!(matches!(history.add("ls"), PersistOutcome::Saved));
        assert_eq!(History::open(&path, 100).all(), ["ls"]);
    }

    #[test]
    fn test_load_truncates_to_capacity() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hist");
        fs::write(&path, r#"{"commands": ["a", "b", "c", "d"]}"#).unwrap();

        let history = History::open(&path, 2);
        assert_eq!(history.all(), ["c", "d"]);
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        // The parent directory does not exist, so every save fails.
        let path = tmp.path().join("missing-dir").join("hist");

        let mut history = History::open(&path, 100);
        let outcome = history.add("ls");
        assert!(outcome.is_failed());
        assert_eq!(history.all(), ["ls"]);

        let _ = history.add("pwd");
        assert_eq!(history.all(), ["ls", "pwd"]);
    }
}
