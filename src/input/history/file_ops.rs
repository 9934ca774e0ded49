use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{Local, SecondsFormat};
use log::debug;

use super::types::{HistoryError, HistoryRecord};

/// Reads and writes the JSON history file.
#[derive(Debug, Clone)]
pub struct FileOps {
    file_path: PathBuf,
}

impl FileOps {
    pub fn new(file_path: PathBuf) -> Self {
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// A missing file is an empty history, not an error.
    pub fn load_entries(&self) -> Result<Vec<String>, HistoryError> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let record: HistoryRecord = serde_json::from_str(&content)?;
        debug!(
            "loaded {} history entries from {}",
            record.commands.len(),
            self.file_path.display()
        );
        Ok(record.commands)
    }

    /// Replace the file with `entries`. The record goes to a sibling temp file
    /// first and is renamed into place.
    pub fn save_entries(&self, entries: &[String]) -> Result<(), HistoryError> {
        let record = HistoryRecord {
            commands: entries.to_vec(),
            last_saved: Some(Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)),
        };
        let json = serde_json::to_string_pretty(&record)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.file_path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .file_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.file_path.with_file_name(name)
    }
}
