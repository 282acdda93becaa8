//! Comic collection migration.
//!
//! Scanner -> metadata resolver -> path mapper -> planner produce a plan
//! without side effects; the execution engine applies it and records every
//! attempt in an append-only undo log.

pub mod config;
pub mod error;
pub mod execution;
pub mod inventory;
pub mod logging;
pub mod mapper;
pub mod metadata;
pub mod planner;

pub use config::Settings;
pub use error::{MigrationError, Result};
pub use execution::{ExecutionEngine, ExecutionMode, ExecutionResult, UndoLog, UndoLogEntry};
pub use inventory::{FileRecord, InventoryScanner};
pub use logging::LoggingContext;
pub use mapper::{select_mapper, PathMapper};
pub use metadata::{ComicMetadata, ContentType, MetadataResolver, Provenance};
pub use planner::{ActionStatus, MigrationAction, PlanReport, PlanSummary, Planner};
