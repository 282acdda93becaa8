//! Metadata Resolver
//!
//! Produces a `ComicMetadata` and a `ContentType` for every file record.
//! Resolution never fails: a missing, unreadable or invalid embedded
//! document degrades to metadata synthesized from the file name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::comic_info::{extract_comic_info, ComicInfo};
use super::model::{ComicMetadata, ContentType};
use crate::config::Settings;
use crate::inventory::FileRecord;

/// Resolved metadata and classification for one record
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub metadata: ComicMetadata,
    pub content_type: ContentType,
}

/// Resolves metadata from embedded documents with a filename fallback
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    /// Lowercase path substrings marking manga
    manga_markers: Vec<String>,

    /// Relative path prefix -> forced content type
    overrides: Vec<(PathBuf, ContentType)>,
}

impl Default for MetadataResolver {
    fn default() -> Self {
        Self {
            manga_markers: vec!["manga".to_string()],
            overrides: Vec::new(),
        }
    }
}

impl MetadataResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .with_manga_markers(settings.manga_path_markers.iter().map(String::as_str))
            .with_overrides(&settings.content_type_overrides)
    }

    pub fn with_manga_markers<'a>(mut self, markers: impl IntoIterator<Item = &'a str>) -> Self {
        self.manga_markers = markers
            .into_iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    pub fn with_overrides(mut self, overrides: &BTreeMap<String, ContentType>) -> Self {
        self.overrides = overrides
            .iter()
            .map(|(prefix, content_type)| (PathBuf::from(prefix), *content_type))
            .collect();
        self
    }

    /// Resolve metadata and content type for a record
    pub fn resolve(&self, record: &FileRecord) -> Resolution {
        let comic_info = match extract_comic_info(&record.path) {
            Ok(Some(info)) => Some(info),
            Ok(None) => {
                tracing::debug!(
                    path = %record.path.display(),
                    "No embedded metadata, using filename"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    path = %record.path.display(),
                    error = %e,
                    "Unreadable embedded metadata, using filename"
                );
                None
            }
        };

        let metadata = match &comic_info {
            Some(info) => ComicMetadata::from_comic_info(info),
            None => ComicMetadata::from_filename(&record.stem()),
        };

        Resolution {
            content_type: self.classify(record, comic_info.as_ref()),
            metadata,
        }
    }

    /// Classify a record.
    ///
    /// An override for the record's relative path wins. Otherwise a manga
    /// flag in the embedded document or a manga marker anywhere in the
    /// lowercased path selects manga; everything else is western.
    pub fn classify(&self, record: &FileRecord, comic_info: Option<&ComicInfo>) -> ContentType {
        if let Some(content_type) = self.override_for(&record.rel_path) {
            return content_type;
        }

        if comic_info.map(ComicInfo::is_manga).unwrap_or(false) {
            return ContentType::Manga;
        }

        let lowered = record.path.to_string_lossy().to_lowercase();
        if self.manga_markers.iter().any(|m| lowered.contains(m.as_str())) {
            ContentType::Manga
        } else {
            ContentType::Western
        }
    }

    /// Most specific override whose prefix covers `rel_path`
    fn override_for(&self, rel_path: &Path) -> Option<ContentType> {
        self.overrides
            .iter()
            .filter(|(prefix, _)| rel_path.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.components().count())
            .map(|(_, content_type)| *content_type)
    }
}
