//! Inventory Scanner
//!
//! Recursively discovers archive files under a root, stats them and
//! fingerprints their content. Discovery is best-effort: a file that cannot
//! be stat'ed or read is skipped with a warning. Only an inaccessible root
//! is fatal.
//!
//! Entries are visited depth-first, sorted by file name at every level, so
//! two scans of the same tree emit records in the same order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};
use walkdir::{DirEntry, WalkDir};

use super::fingerprint::fingerprint_file;
use super::record::FileRecord;
use crate::config::{normalize_extension, Settings, DEFAULT_EXTENSIONS, DEFAULT_HASH_CHUNK_SIZE};
use crate::error::{MigrationError, Result};

/// Progress notification, called once per discovered candidate file
pub type ProgressCallback<'a> = &'a dyn Fn(&Path);

/// Scanner configuration
#[derive(Debug, Clone)]
pub struct InventoryScanner {
    /// Extension allow-list (lowercase, leading dot)
    extensions: Vec<String>,

    /// Bytes read per fingerprint chunk
    chunk_size: usize,

    /// Maximum depth to scan (0 = unlimited)
    max_depth: usize,
}

impl Default for InventoryScanner {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            chunk_size: DEFAULT_HASH_CHUNK_SIZE,
            max_depth: 0,
        }
    }
}

/// Statistics from a scan operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    /// Number of records produced
    pub total_files: usize,

    /// Total size of all recorded files in bytes
    pub total_size_bytes: u64,

    /// Time taken to scan in milliseconds
    pub scan_duration_ms: u64,

    /// Entries skipped because they could not be read
    pub errors: usize,
}

/// Result of one scan
#[derive(Debug, Clone)]
pub struct Inventory {
    /// Canonical scan root
    pub root: PathBuf,

    /// Records in emission order
    pub records: Vec<FileRecord>,

    pub stats: ScanStats,
}

impl InventoryScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scanner using the allow-list and chunk size from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_extensions(settings.extensions.iter().map(String::as_str))
            .with_chunk_size(settings.hash_chunk_size)
    }

    /// Replace the extension allow-list
    pub fn with_extensions<'a>(mut self, extensions: impl IntoIterator<Item = &'a str>) -> Self {
        self.extensions = extensions.into_iter().map(normalize_extension).collect();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set maximum scan depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Whether a path's extension is in the allow-list (case-insensitive)
    pub fn is_candidate(&self, path: &Path) -> bool {
        match path.extension() {
            Some(ext) => {
                let ext = normalize_extension(&ext.to_string_lossy());
                self.extensions.iter().any(|e| *e == ext)
            }
            None => false,
        }
    }

    /// Scan a root directory
    pub fn scan(&self, root: &Path) -> Result<Inventory> {
        self.scan_with_progress(root, None)
    }

    /// Scan a root directory, reporting each candidate file as it is found
    pub fn scan_with_progress(
        &self,
        root: &Path,
        progress: Option<ProgressCallback<'_>>,
    ) -> Result<Inventory> {
        let start = Instant::now();
        let root = open_root(root)?;
        let mut stats = ScanStats::default();
        let mut records = Vec::new();

        tracing::info!(
            root = %root.display(),
            extensions = ?self.extensions,
            "Scanning for archives"
        );

        let mut walker = WalkDir::new(&root).follow_links(false).sort_by_file_name();
        if self.max_depth > 0 {
            walker = walker.max_depth(self.max_depth);
        }

        for entry_result in walker {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable entry");
                    stats.errors += 1;
                    continue;
                }
            };

            if !self.is_candidate(entry.path()) || !is_regular_file(&entry) {
                continue;
            }

            if let Some(callback) = progress {
                callback(entry.path());
            }

            match self.record_from_entry(&root, &entry) {
                Ok(record) => {
                    stats.total_files += 1;
                    stats.total_size_bytes += record.size_bytes;
                    records.push(record);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %entry.path().display(),
                        error = %e,
                        "Could not access file, skipping"
                    );
                    stats.errors += 1;
                }
            }
        }

        stats.scan_duration_ms = start.elapsed().as_millis() as u64;

        tracing::info!(
            files = stats.total_files,
            bytes = stats.total_size_bytes,
            skipped = stats.errors,
            duration_ms = stats.scan_duration_ms,
            "Scan complete"
        );

        Ok(Inventory {
            root,
            records,
            stats,
        })
    }

    /// Build a record from a walk entry
    fn record_from_entry(&self, root: &Path, entry: &DirEntry) -> io::Result<FileRecord> {
        let path = entry.path().to_path_buf();
        // Follows a symlinked archive to its target
        let metadata = fs::metadata(entry.path())?;

        let modified: DateTime<Utc> = metadata
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH)
            .into();

        let hash = fingerprint_file(&path, self.chunk_size)?;

        let rel_path = path
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone());

        let extension = path
            .extension()
            .map(|e| normalize_extension(&e.to_string_lossy()))
            .unwrap_or_default();

        Ok(FileRecord {
            name: entry.file_name().to_string_lossy().to_string(),
            rel_path,
            extension,
            size_bytes: metadata.len(),
            modified_time: modified,
            hash,
            path,
        })
    }
}

/// Regular files, and symlinks that resolve to one. Directory links are
/// not followed.
fn is_regular_file(entry: &DirEntry) -> bool {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return true;
    }
    if !file_type.is_symlink() {
        return false;
    }

    match fs::metadata(entry.path()) {
        Ok(metadata) if metadata.is_file() => true,
        Ok(_) => false,
        Err(e) => {
            tracing::warn!(
                path = %entry.path().display(),
                error = %e,
                "Skipping broken symlink"
            );
            false
        }
    }
}

/// Resolve and check the scan root. Any failure here is fatal.
fn open_root(root: &Path) -> Result<PathBuf> {
    let scan_root = |source: io::Error| MigrationError::ScanRoot {
        path: root.to_path_buf(),
        source,
    };

    let canonical = fs::canonicalize(root).map_err(scan_root)?;

    let metadata = fs::metadata(&canonical).map_err(scan_root)?;
    if !metadata.is_dir() {
        return Err(scan_root(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        )));
    }

    // Listing the root up front surfaces permission errors as fatal
    fs::read_dir(&canonical).map_err(scan_root)?;

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("Manga/Berserk")).unwrap();
        fs::create_dir_all(dir.path().join("Western")).unwrap();

        let mut f = File::create(dir.path().join("Western/Batman 001.cbz")).unwrap();
        f.write_all(b"batman bytes").unwrap();

        let mut f = File::create(dir.path().join("Manga/Berserk/Berserk v01.CBR")).unwrap();
        f.write_all(b"berserk bytes").unwrap();

        let mut f = File::create(dir.path().join("Western/notes.txt")).unwrap();
        f.write_all(b"not an archive").unwrap();

        File::create(dir.path().join("cover.pdf")).unwrap();

        dir
    }

    #[test]
    fn test_scan_filters_by_extension() {
        let temp_dir = create_test_dir();
        let inventory = InventoryScanner::new().scan(temp_dir.path()).unwrap();

        let names: Vec<&str> = inventory.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"Batman 001.cbz"));
        assert!(names.contains(&"Berserk v01.CBR"));
        assert!(names.contains(&"cover.pdf"));
        assert!(!names.contains(&"notes.txt"));
        assert_eq!(inventory.stats.total_files, 3);
    }

    #[test]
    fn test_record_fields() {
        let temp_dir = create_test_dir();
        let inventory = InventoryScanner::new().scan(temp_dir.path()).unwrap();

        let record = inventory
            .records
            .iter()
            .find(|r| r.name == "Berserk v01.CBR")
            .unwrap();

        assert_eq!(record.extension, ".cbr");
        assert_eq!(record.rel_path, PathBuf::from("Manga/Berserk/Berserk v01.CBR"));
        assert_eq!(record.size_bytes, 13);
        assert!(record.path.is_absolute());
        assert_eq!(record.hash.len(), 64);
    }

    #[test]
    fn test_scan_order_is_deterministic() {
        let temp_dir = create_test_dir();
        let scanner = InventoryScanner::new();

        let first: Vec<PathBuf> = scanner
            .scan(temp_dir.path())
            .unwrap()
            .records
            .into_iter()
            .map(|r| r.rel_path)
            .collect();
        let second: Vec<PathBuf> = scanner
            .scan(temp_dir.path())
            .unwrap()
            .records
            .into_iter()
            .map(|r| r.rel_path)
            .collect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                PathBuf::from("Manga/Berserk/Berserk v01.CBR"),
                PathBuf::from("Western/Batman 001.cbz"),
                PathBuf::from("cover.pdf"),
            ]
        );
    }

    #[test]
    fn test_custom_extensions() {
        let temp_dir = create_test_dir();
        let scanner = InventoryScanner::new().with_extensions(["CBZ"]);
        let inventory = scanner.scan(temp_dir.path()).unwrap();

        assert_eq!(inventory.records.len(), 1);
        assert_eq!(inventory.records[0].name, "Batman 001.cbz");
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");

        let err = InventoryScanner::new().scan(&missing).unwrap_err();
        assert!(matches!(err, MigrationError::ScanRoot { .. }));
    }

    #[test]
    fn test_file_root_is_fatal() {
        let temp_dir = create_test_dir();
        let err = InventoryScanner::new()
            .scan(&temp_dir.path().join("cover.pdf"))
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_progress_callback() {
        let temp_dir = create_test_dir();
        let seen = RefCell::new(Vec::new());
        let callback = |path: &Path| seen.borrow_mut().push(path.to_path_buf());

        InventoryScanner::new()
            .scan_with_progress(temp_dir.path(), Some(&callback))
            .unwrap();

        assert_eq!(seen.borrow().len(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Open.cbz"), b"readable").unwrap();
        let locked = temp_dir.path().join("Locked.cbz");
        fs::write(&locked, b"locked").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores file modes
        if File::open(&locked).is_ok() {
            return;
        }

        let inventory = InventoryScanner::new().scan(temp_dir.path()).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

        assert_eq!(inventory.records.len(), 1);
        assert_eq!(inventory.records[0].name, "Open.cbz");
        assert_eq!(inventory.stats.total_files, 1);
        assert_eq!(inventory.stats.errors, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_archive_is_included() {
        let temp_dir = create_test_dir();
        let target = temp_dir.path().join("Western/Batman 001.cbz");
        std::os::unix::fs::symlink(&target, temp_dir.path().join("Linked.cbz")).unwrap();
        std::os::unix::fs::symlink(
            temp_dir.path().join("gone.cbz"),
            temp_dir.path().join("Broken.cbz"),
        )
        .unwrap();

        let inventory = InventoryScanner::new().scan(temp_dir.path()).unwrap();

        let linked = inventory
            .records
            .iter()
            .find(|r| r.name == "Linked.cbz")
            .unwrap();
        assert_eq!(linked.size_bytes, 12);
        assert_eq!(linked.rel_path, PathBuf::from("Linked.cbz"));
        assert_eq!(inventory.records.len(), 4);
        assert!(!inventory.records.iter().any(|r| r.name == "Broken.cbz"));
    }

    #[test]
    fn test_max_depth() {
        let temp_dir = create_test_dir();
        let inventory = InventoryScanner::new()
            .with_max_depth(1)
            .scan(temp_dir.path())
            .unwrap();

        assert_eq!(inventory.records.len(), 1);
        assert_eq!(inventory.records[0].name, "cover.pdf");
    }
}
