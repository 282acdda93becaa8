//! Execution: applying plans and reversing them.
//!
//! - `executor`: the `ExecutionEngine` (copy or move per run)
//! - `undo_log`: append-only JSON lines record of every attempt
//! - `undo`: preflight and reversal from the log

mod executor;
mod undo;
mod undo_log;

pub use executor::{ExecutionEngine, ExecutionMode, ExecutionResult};
pub use undo::{preflight_undo, reversible_entries, undo, UndoPreflightResult, UndoResult};
pub use undo_log::{UndoLog, UndoLogEntry};
