//! Execution Engine
//!
//! Applies approved (COPY) actions from a plan. Each action is executed as
//! a metadata-preserving copy or as a move, depending on the run's mode.
//! Every attempt is appended to the undo log before the next one starts,
//! whether it succeeded or not. A failed action never stops the batch; only
//! an undo log failure does.

use chrono::Utc;
use filetime::FileTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use uuid::Uuid;

use super::undo_log::{UndoLog, UndoLogEntry};
use crate::config::{Settings, DEFAULT_HASH_CHUNK_SIZE};
use crate::error::Result;
use crate::inventory::fingerprint_file;
use crate::planner::MigrationAction;

/// How approved actions are applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Duplicate the file; the original stays in place
    #[default]
    Copy,
    /// Relocate the file; the original path no longer exists afterwards
    Move,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Copy => f.write_str("COPY"),
            ExecutionMode::Move => f.write_str("MOVE"),
        }
    }
}

/// Result of one execution run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub run_id: Uuid,
    pub mode: ExecutionMode,
    /// One entry per submitted action, in submission order
    pub outcomes: Vec<UndoLogEntry>,
}

impl ExecutionResult {
    pub fn completed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    /// True when no submitted action failed
    pub fn success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn errors(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|o| {
                o.error
                    .as_ref()
                    .map(|e| format!("{} -> {}: {}", o.source.display(), o.target.display(), e))
            })
            .collect()
    }
}

/// Applies plans to the filesystem
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    undo_log: UndoLog,

    /// Re-fingerprint targets after each operation
    verify_integrity: bool,

    chunk_size: usize,
}

impl ExecutionEngine {
    pub fn new(undo_log: UndoLog) -> Self {
        Self {
            undo_log,
            verify_integrity: true,
            chunk_size: DEFAULT_HASH_CHUNK_SIZE,
        }
    }

    /// Engine writing to the configured undo log
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let undo_log = UndoLog::open(&settings.undo_log_path)?;
        Ok(Self::new(undo_log)
            .with_integrity_check(settings.verify_copy_integrity)
            .with_chunk_size(settings.hash_chunk_size))
    }

    pub fn with_integrity_check(mut self, enabled: bool) -> Self {
        self.verify_integrity = enabled;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo_log
    }

    /// Execute every COPY action in `actions`; other statuses are ignored.
    ///
    /// Returns `Err` only when the undo log cannot be written.
    pub fn execute(&self, actions: &[MigrationAction], mode: ExecutionMode) -> Result<ExecutionResult> {
        let run_id = Uuid::new_v4();
        let approved: Vec<&MigrationAction> = actions.iter().filter(|a| a.is_approved()).collect();

        tracing::info!(
            run_id = %run_id,
            mode = %mode,
            actions = approved.len(),
            "Starting execution"
        );

        let mut outcomes = Vec::with_capacity(approved.len());
        for action in approved {
            let source = action.source_path().to_path_buf();
            let target = action
                .target_path()
                .map(Path::to_path_buf)
                .unwrap_or_default();

            let (fingerprint, outcome) = self.apply(&source, &target, mode);

            let entry = UndoLogEntry {
                run_id,
                source,
                target,
                operation: mode,
                timestamp: Utc::now(),
                success: outcome.is_ok(),
                error: outcome.err(),
                fingerprint,
            };

            match &entry.error {
                None => tracing::info!(
                    source = %entry.source.display(),
                    destination = %entry.target.display(),
                    "{} succeeded",
                    mode
                ),
                Some(e) => tracing::error!(
                    source = %entry.source.display(),
                    destination = %entry.target.display(),
                    error = %e,
                    "{} failed",
                    mode
                ),
            }

            self.undo_log.append(&entry)?;
            outcomes.push(entry);
        }

        let result = ExecutionResult {
            run_id,
            mode,
            outcomes,
        };

        tracing::info!(
            run_id = %run_id,
            completed = result.completed_count(),
            failed = result.failed_count(),
            "Execution complete"
        );

        Ok(result)
    }

    /// Run one operation, returning the source fingerprint (when taken)
    /// and the outcome
    fn apply(
        &self,
        source: &Path,
        target: &Path,
        mode: ExecutionMode,
    ) -> (Option<String>, std::result::Result<(), String>) {
        if target.as_os_str().is_empty() {
            return (None, Err("Action has no target path".to_string()));
        }

        let fingerprint = if self.verify_integrity {
            match fingerprint_file(source, self.chunk_size) {
                Ok(hash) => Some(hash),
                Err(e) => {
                    return (
                        None,
                        Err(format!("Failed to fingerprint source {}: {}", source.display(), e)),
                    )
                }
            }
        } else {
            None
        };

        let transferred = match mode {
            ExecutionMode::Copy => perform_copy(source, target),
            ExecutionMode::Move => perform_move(source, target),
        };
        if let Err(e) = transferred {
            return (fingerprint, Err(e));
        }

        if let Some(expected) = &fingerprint {
            if let Err(e) = self.check_target(target, expected, mode) {
                return (fingerprint.clone(), Err(e));
            }
        }

        (fingerprint, Ok(()))
    }

    /// Compare the target with the source fingerprint. A copy that fails
    /// the check is discarded so the action can be retried; a moved target
    /// is the only remaining copy and stays in place.
    fn check_target(
        &self,
        target: &Path,
        expected: &str,
        mode: ExecutionMode,
    ) -> std::result::Result<(), String> {
        let checked = match fingerprint_file(target, self.chunk_size) {
            Ok(actual) if actual == expected => return Ok(()),
            Ok(actual) => format!(
                "Integrity check failed: expected {}, found {}",
                expected, actual
            ),
            Err(e) => format!("Failed to fingerprint target {}: {}", target.display(), e),
        };

        if mode == ExecutionMode::Copy {
            discard(target);
        }
        Err(checked)
    }
}

/// Create the destination's parent tree; an existing tree is fine
fn ensure_parent(destination: &Path) -> std::result::Result<(), String> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create destination directory: {}", e))?;
        }
    }
    Ok(())
}

/// Copy a file, keeping permissions and access/modification times.
/// Never overwrites an existing destination.
pub(crate) fn perform_copy(source: &Path, destination: &Path) -> std::result::Result<(), String> {
    ensure_parent(destination)?;
    copy_preserving(source, destination).map_err(|e| format!("Failed to copy: {}", e))
}

/// Move a file. Tries rename first (same filesystem), then falls back to
/// copy + remove.
pub(crate) fn perform_move(source: &Path, destination: &Path) -> std::result::Result<(), String> {
    ensure_parent(destination)?;

    if destination.exists() {
        return Err(format!("Destination already exists: {}", destination.display()));
    }

    if fs::rename(source, destination).is_ok() {
        return Ok(());
    }
    move_by_copy(source, destination, |path| fs::remove_file(path))
}

/// Copy then remove the source. If the source cannot be removed the copy
/// is discarded, leaving the filesystem as it was before the attempt.
fn move_by_copy(
    source: &Path,
    destination: &Path,
    remove_source: impl FnOnce(&Path) -> io::Result<()>,
) -> std::result::Result<(), String> {
    copy_preserving(source, destination).map_err(|e| format!("Failed to copy: {}", e))?;

    if let Err(e) = remove_source(source) {
        discard(destination);
        return Err(format!("Failed to remove source: {}", e));
    }
    Ok(())
}

/// Remove a destination written by a failed attempt
fn discard(destination: &Path) {
    if let Err(e) = fs::remove_file(destination) {
        tracing::warn!(
            destination = %destination.display(),
            error = %e,
            "Could not remove partial destination"
        );
    }
}

fn copy_preserving(source: &Path, destination: &Path) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let metadata = reader.metadata()?;

    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)?;

    let copied = io::copy(&mut reader, &mut writer)
        .and_then(|_| writer.sync_all())
        .and_then(|_| fs::set_permissions(destination, metadata.permissions()))
        .and_then(|_| {
            filetime::set_file_times(
                destination,
                FileTime::from_last_access_time(&metadata),
                FileTime::from_last_modification_time(&metadata),
            )
        });

    if let Err(e) = copied {
        // Remove the partial file we created
        drop(writer);
        discard(destination);
        return Err(e);
    }
    Ok(())
}
