//! Append-only in-memory failure log, flushed once at run end

use chrono::Utc;
use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

/// Buffer of timestamped failure records. Concurrent appends from multiple
/// workers are all preserved; a record never overwrites another.
#[derive(Debug, Default)]
pub struct ErrorLog {
    records: Mutex<Vec<String>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one timestamped record. Never panics, even on a poisoned lock.
    pub fn record(&self, path: impl Display, message: impl Display) {
        let entry = format!("[{}] {} - {}", Utc::now().to_rfc3339(), path, message);
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        records.push(entry);
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Write the buffer to `path`, one record per line. The caller decides
    /// what a flush failure means; the run contract treats it as best-effort.
    pub fn flush(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let records = self.snapshot();
        let mut contents = records.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        std::fs::write(path, contents)
    }
}
