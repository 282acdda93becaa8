//! Inventory module: discovery and fingerprinting of archive files.
//!
//! This module provides:
//! - `record`: the immutable `FileRecord`
//! - `fingerprint`: streaming SHA-256 content hashes
//! - `scanner`: recursive best-effort discovery
//! - `verify`: backup verification against a saved inventory

mod fingerprint;
mod record;
mod scanner;
mod verify;

pub use fingerprint::*;
pub use record::*;
pub use scanner::*;
pub use verify::*;

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;

/// Write an inventory as a JSON array.
///
/// Writes to a temporary file first, then renames over the target.
pub fn save_inventory(records: &[FileRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("tmp");
    let file = File::create(&temp_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    fs::rename(&temp_path, path)?;

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        "Saved inventory"
    );
    Ok(())
}

/// Read an inventory written by `save_inventory`
pub fn load_inventory(path: &Path) -> Result<Vec<FileRecord>> {
    let file = File::open(path)?;
    let records: Vec<FileRecord> = serde_json::from_reader(BufReader::new(file))?;
    Ok(records)
}
