//! Backup verification against a saved inventory.
//!
//! Files are matched by fingerprint only, so a backup with a different
//! layout still verifies as long as every original's content is present.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::record::FileRecord;
use super::scanner::InventoryScanner;
use super::load_inventory;
use crate::error::Result;

/// Outcome of comparing an original inventory with a backup location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub total_original: usize,
    pub total_backup: usize,
    /// Backup files whose content exists in the original inventory
    pub matches: Vec<FileRecord>,
    /// Original files with no content match in the backup
    pub missing: Vec<FileRecord>,
    /// Backup files whose content is not in the original inventory
    pub extra: Vec<FileRecord>,
}

impl VerificationReport {
    /// True when every original file has a content match in the backup
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Re-scan `backup_root` and compare it against `original`
pub fn verify_backup(
    original: &[FileRecord],
    backup_root: &Path,
    scanner: &InventoryScanner,
) -> Result<VerificationReport> {
    tracing::info!(
        backup = %backup_root.display(),
        originals = original.len(),
        "Verifying backup"
    );

    let backup = scanner.scan(backup_root)?.records;

    let original_hashes: HashSet<&str> = original.iter().map(|r| r.hash.as_str()).collect();
    let backup_hashes: HashSet<&str> = backup.iter().map(|r| r.hash.as_str()).collect();

    let mut report = VerificationReport {
        total_original: original.len(),
        total_backup: backup.len(),
        ..Default::default()
    };

    for item in &backup {
        if original_hashes.contains(item.hash.as_str()) {
            report.matches.push(item.clone());
        } else {
            report.extra.push(item.clone());
        }
    }

    report.missing = original
        .iter()
        .filter(|item| !backup_hashes.contains(item.hash.as_str()))
        .cloned()
        .collect();

    if !report.is_complete() {
        tracing::warn!(
            missing = report.missing.len(),
            "Backup is missing original content"
        );
    }

    Ok(report)
}

/// Load an inventory file and verify `backup_root` against it
pub fn verify_backup_from_file(
    inventory_path: &Path,
    backup_root: &Path,
    scanner: &InventoryScanner,
) -> Result<VerificationReport> {
    let original = load_inventory(inventory_path)?;
    verify_backup(&original, backup_root, scanner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::save_inventory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_verify_backup_classifies_by_content() {
        let source = TempDir::new().unwrap();
        let backup = TempDir::new().unwrap();

        fs::write(source.path().join("a.cbz"), b"alpha").unwrap();
        fs::write(source.path().join("b.cbz"), b"beta").unwrap();

        // Backup renamed a.cbz, lost b.cbz, and has one unknown file
        fs::create_dir(backup.path().join("nested")).unwrap();
        fs::write(backup.path().join("nested/renamed.cbz"), b"alpha").unwrap();
        fs::write(backup.path().join("unknown.cbz"), b"gamma").unwrap();

        let scanner = InventoryScanner::new();
        let original = scanner.scan(source.path()).unwrap().records;

        let report = verify_backup(&original, backup.path(), &scanner).unwrap();

        assert_eq!(report.total_original, 2);
        assert_eq!(report.total_backup, 2);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].name, "renamed.cbz");
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].name, "b.cbz");
        assert_eq!(report.extra.len(), 1);
        assert_eq!(report.extra[0].name, "unknown.cbz");
        assert!(!report.is_complete());
    }

    #[test]
    fn test_verify_from_saved_inventory() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        fs::write(source.path().join("a.cbz"), b"alpha").unwrap();

        let scanner = InventoryScanner::new();
        let original = scanner.scan(source.path()).unwrap().records;
        let inventory_path = out.path().join("inventory.json");
        save_inventory(&original, &inventory_path).unwrap();

        let report =
            verify_backup_from_file(&inventory_path, source.path(), &scanner).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.matches.len(), 1);
    }
}
