//! Scanned file record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One discovered archive. Created once per scan and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Absolute path
    pub path: PathBuf,

    /// Path relative to the scan root
    pub rel_path: PathBuf,

    /// File name including extension
    pub name: String,

    /// Lowercase extension with leading dot (".cbz")
    pub extension: String,

    pub size_bytes: u64,

    pub modified_time: DateTime<Utc>,

    /// SHA-256 of the full content, hex-encoded
    pub hash: String,
}

impl FileRecord {
    /// File name without its extension
    pub fn stem(&self) -> String {
        stem_of(&self.path)
    }

    /// Extension as written on disk, with leading dot (".CBZ" stays ".CBZ")
    pub fn suffix(&self) -> String {
        self.path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }
}

pub(crate) fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileRecord {
        let path = PathBuf::from(path);
        FileRecord {
            name: path.file_name().unwrap().to_string_lossy().to_string(),
            rel_path: PathBuf::from(path.file_name().unwrap()),
            extension: ".cbz".to_string(),
            size_bytes: 0,
            modified_time: Utc::now(),
            hash: String::new(),
            path,
        }
    }

    #[test]
    fn test_stem_and_suffix() {
        let rec = record("/comics/Batman 001.CBZ");
        assert_eq!(rec.stem(), "Batman 001");
        assert_eq!(rec.suffix(), ".CBZ");
    }

    #[test]
    fn test_stem_keeps_inner_dots() {
        let rec = record("/comics/Vol.1.Chapter.2.cbz");
        assert_eq!(rec.stem(), "Vol.1.Chapter.2");
        assert_eq!(rec.suffix(), ".cbz");
    }
}
