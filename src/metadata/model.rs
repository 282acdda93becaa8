//! Metadata types shared by the resolver, mappers and planner.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::comic_info::ComicInfo;

/// Series name used when nothing better is known
pub const UNKNOWN_SERIES: &str = "Unknown Series";

/// How a metadata record was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Parsed from the archive's embedded document
    Embedded,
    /// Synthesized from the file name
    Filename,
    /// Supplied by an external catalog lookup
    Provider,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provenance::Embedded => "embedded",
            Provenance::Filename => "filename",
            Provenance::Provider => "provider",
        };
        f.write_str(name)
    }
}

/// Content classification. Selects the naming convention and target root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Western,
    Manga,
    /// Declared for routing; no mapper exists yet
    Hentai,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Western => "western",
            ContentType::Manga => "manga",
            ContentType::Hentai => "hentai",
        };
        f.write_str(name)
    }
}

/// Normalized descriptive metadata for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicMetadata {
    pub series: String,
    pub title: Option<String>,
    /// Issue or chapter number as written ("1", "12.5", "Annual")
    pub issue_number: Option<String>,
    pub volume: Option<i64>,
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub publisher: Option<String>,
    pub summary: Option<String>,
    pub provenance: Provenance,
}

impl ComicMetadata {
    /// Minimal record from a file stem: series and title are both the stem
    pub fn from_filename(stem: &str) -> Self {
        let series = if stem.trim().is_empty() {
            UNKNOWN_SERIES.to_string()
        } else {
            stem.to_string()
        };

        Self {
            title: Some(series.clone()),
            series,
            issue_number: None,
            volume: None,
            year: None,
            month: None,
            day: None,
            publisher: None,
            summary: None,
            provenance: Provenance::Filename,
        }
    }

    /// Record from a parsed embedded document
    pub fn from_comic_info(info: &ComicInfo) -> Self {
        Self {
            series: non_empty(&info.series).unwrap_or_else(|| UNKNOWN_SERIES.to_string()),
            title: non_empty(&info.title),
            issue_number: non_empty(&info.number),
            volume: info.volume,
            year: info.year,
            month: info.month,
            day: info.day,
            publisher: non_empty(&info.publisher),
            summary: non_empty(&info.summary),
            provenance: Provenance::Embedded,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_filename() {
        let meta = ComicMetadata::from_filename("Saga 012");
        assert_eq!(meta.series, "Saga 012");
        assert_eq!(meta.title.as_deref(), Some("Saga 012"));
        assert_eq!(meta.provenance, Provenance::Filename);
        assert!(meta.year.is_none());
    }

    #[test]
    fn test_from_comic_info_defaults_series() {
        let info = ComicInfo {
            title: Some("  ".to_string()),
            number: Some("7".to_string()),
            year: Some(1999),
            ..Default::default()
        };

        let meta = ComicMetadata::from_comic_info(&info);
        assert_eq!(meta.series, UNKNOWN_SERIES);
        assert!(meta.title.is_none());
        assert_eq!(meta.issue_number.as_deref(), Some("7"));
        assert_eq!(meta.year, Some(1999));
        assert_eq!(meta.provenance, Provenance::Embedded);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&ContentType::Manga).unwrap(), "\"manga\"");
        assert_eq!(serde_json::to_string(&Provenance::Filename).unwrap(), "\"filename\"");
        assert_eq!(ContentType::Hentai.to_string(), "hentai");
    }
}
