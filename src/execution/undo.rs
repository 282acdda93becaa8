//! Reversal of executed migrations from the undo log.
//!
//! Successful entries are reversed newest-first: a copy is undone by
//! removing the target, a move by moving the target back to its source.
//! The log itself is only read, never rewritten.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::executor::{perform_move, ExecutionMode};
use super::undo_log::{UndoLog, UndoLogEntry};
use crate::config::DEFAULT_HASH_CHUNK_SIZE;
use crate::error::Result;
use crate::inventory::fingerprint_file;

/// State check before reversing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoPreflightResult {
    /// Whether at least one entry can be reversed and nothing blocks
    pub can_proceed: bool,
    /// Targets that no longer exist (already reversed or removed)
    pub missing_files: Vec<PathBuf>,
    /// Move sources that are occupied again
    pub blocking_files: Vec<PathBuf>,
    /// Targets whose content changed since they were written
    pub modified_files: Vec<PathBuf>,
    pub safe_operations: usize,
    pub total_operations: usize,
}

/// Outcome of a reversal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoResult {
    pub success: bool,
    pub operations_undone: usize,
    pub operations_skipped: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryState {
    Safe,
    Missing,
    Blocking,
    Modified,
}

/// Successful entries, newest first, optionally limited to one run
pub fn reversible_entries(entries: &[UndoLogEntry], run_id: Option<Uuid>) -> Vec<UndoLogEntry> {
    entries
        .iter()
        .rev()
        .filter(|e| e.success)
        .filter(|e| run_id.map(|id| e.run_id == id).unwrap_or(true))
        .cloned()
        .collect()
}

/// Check which logged operations can be reversed
pub fn preflight_undo(log: &UndoLog, run_id: Option<Uuid>) -> Result<UndoPreflightResult> {
    let entries = reversible_entries(&log.read_entries()?, run_id);
    let mut result = UndoPreflightResult {
        total_operations: entries.len(),
        ..Default::default()
    };

    for entry in &entries {
        match entry_state(entry) {
            EntryState::Safe => result.safe_operations += 1,
            EntryState::Missing => result.missing_files.push(entry.target.clone()),
            EntryState::Blocking => result.blocking_files.push(entry.source.clone()),
            EntryState::Modified => result.modified_files.push(entry.target.clone()),
        }
    }

    result.can_proceed = result.blocking_files.is_empty() && result.safe_operations > 0;
    Ok(result)
}

/// Reverse logged operations. Entries that are not safe to reverse are
/// skipped; failures are collected and the rest continue.
pub fn undo(log: &UndoLog, run_id: Option<Uuid>) -> Result<UndoResult> {
    let entries = reversible_entries(&log.read_entries()?, run_id);
    let mut result = UndoResult::default();

    tracing::info!(
        path = %log.path().display(),
        entries = entries.len(),
        "Reversing logged operations"
    );

    for entry in &entries {
        let state = entry_state(entry);
        if state != EntryState::Safe {
            tracing::warn!(
                destination = %entry.target.display(),
                state = ?state,
                "Skipping operation that cannot be reversed"
            );
            result.operations_skipped += 1;
            continue;
        }

        match reverse(entry) {
            Ok(()) => {
                tracing::info!(
                    source = %entry.source.display(),
                    destination = %entry.target.display(),
                    "Reversed {}",
                    entry.operation
                );
                result.operations_undone += 1;
            }
            Err(e) => {
                tracing::error!(destination = %entry.target.display(), error = %e, "Undo failed");
                result.errors.push(e);
            }
        }
    }

    result.success = result.errors.is_empty();
    Ok(result)
}

fn entry_state(entry: &UndoLogEntry) -> EntryState {
    if !entry.target.exists() {
        return EntryState::Missing;
    }

    if entry.operation == ExecutionMode::Move && entry.source.exists() {
        return EntryState::Blocking;
    }

    if let Some(expected) = &entry.fingerprint {
        match fingerprint_file(&entry.target, DEFAULT_HASH_CHUNK_SIZE) {
            Ok(actual) if actual == *expected => {}
            _ => return EntryState::Modified,
        }
    }

    EntryState::Safe
}

fn reverse(entry: &UndoLogEntry) -> std::result::Result<(), String> {
    match entry.operation {
        ExecutionMode::Copy => remove_copy(&entry.target),
        ExecutionMode::Move => perform_move(&entry.target, &entry.source),
    }
}

fn remove_copy(target: &Path) -> std::result::Result<(), String> {
    fs::remove_file(target).map_err(|e| format!("Failed to remove {}: {}", target.display(), e))
}
