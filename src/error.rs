//! Crate-wide error type.
//!
//! Most failures inside the pipeline are recovered locally (fallback
//! metadata, ERROR actions, failed execution outcomes). The variants here
//! are what still reaches a caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    /// The scan root could not be accessed. Fatal for a scan.
    #[error("Cannot access scan root {}: {source}", path.display())]
    ScanRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The undo log could not be opened, locked or written. Fatal for a run.
    #[error("Cannot write undo log {}: {message}", path.display())]
    UndoLog { path: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Metadata error: {0}")]
    Metadata(String),
}

impl MigrationError {
    /// Whether this error must stop the whole run rather than one file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MigrationError::ScanRoot { .. } | MigrationError::UndoLog { .. }
        )
    }
}

impl From<zip::result::ZipError> for MigrationError {
    fn from(err: zip::result::ZipError) -> Self {
        MigrationError::Archive(err.to_string())
    }
}

impl From<quick_xml::Error> for MigrationError {
    fn from(err: quick_xml::Error) -> Self {
        MigrationError::Metadata(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let root = MigrationError::ScanRoot {
            path: PathBuf::from("/missing"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(root.is_fatal());

        let log = MigrationError::UndoLog {
            path: PathBuf::from("/log.jsonl"),
            message: "disk full".to_string(),
        };
        assert!(log.is_fatal());

        assert!(!MigrationError::Metadata("bad xml".to_string()).is_fatal());
    }

    #[test]
    fn test_display_names_path() {
        let err = MigrationError::ScanRoot {
            path: PathBuf::from("/comics"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/comics"));
    }
}
