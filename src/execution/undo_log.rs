//! Undo Log
//!
//! Append-only JSON lines file with one entry per executed action,
//! successful or not. Entries are never rewritten or truncated.
//!
//! ## Concurrency Safety
//! Each append takes an exclusive fs2 lock on the log file and writes the
//! whole line in one call before syncing, so concurrent writers cannot
//! interleave partial lines.

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::executor::ExecutionMode;
use crate::error::{MigrationError, Result};

/// Record of one attempted copy or move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoLogEntry {
    /// Execution run this attempt belongs to
    pub run_id: Uuid,
    pub source: PathBuf,
    pub target: PathBuf,
    pub operation: ExecutionMode,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub error: Option<String>,
    /// Source fingerprint taken before the operation, when computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Handle to the undo log file
#[derive(Debug, Clone)]
pub struct UndoLog {
    path: PathBuf,
}

impl UndoLog {
    /// Open (creating if needed) the log at `path`.
    ///
    /// Fails when the file cannot be created or opened for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let log = Self { path: path.into() };

        if let Some(parent) = log.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| log.error("create directory", e))?;
            }
        }
        log.open_append()?;

        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry as a single line, then flush and sync
    pub fn append(&self, entry: &UndoLogEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry).map_err(|e| MigrationError::UndoLog {
            path: self.path.clone(),
            message: format!("Failed to serialize entry: {}", e),
        })?;
        line.push('\n');

        let mut file = self.open_append()?;
        FileExt::lock_exclusive(&file).map_err(|e| self.error("lock", e))?;

        let written = file
            .write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .and_then(|_| file.sync_data());

        // Unlock even when the write failed
        let unlocked = FileExt::unlock(&file);
        written.map_err(|e| self.error("write", e))?;
        unlocked.map_err(|e| self.error("unlock", e))?;

        Ok(())
    }

    /// Read every entry in append order.
    ///
    /// A missing log reads as empty. Lines that do not parse (for example
    /// a torn final line after a crash) are skipped with a warning.
    pub fn read_entries(&self) -> Result<Vec<UndoLogEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.error("open", e)),
        };
        FileExt::lock_shared(&file).map_err(|e| self.error("lock", e))?;

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(&file).lines().enumerate() {
            let line = line.map_err(|e| self.error("read", e))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<UndoLogEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    line = index + 1,
                    error = %e,
                    "Skipping unreadable undo log line"
                ),
            }
        }

        FileExt::unlock(&file).map_err(|e| self.error("unlock", e))?;
        Ok(entries)
    }

    fn open_append(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.error("open", e))
    }

    fn error(&self, action: &str, err: io::Error) -> MigrationError {
        MigrationError::UndoLog {
            path: self.path.clone(),
            message: format!("Failed to {}: {}", action, err),
        }
    }
}
