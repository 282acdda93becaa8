//! Embedded `ComicInfo.xml` handling.
//!
//! The document is a flat element list under a single root
//! (`<ComicInfo><Series>Batman</Series>...</ComicInfo>`). Unknown tags are
//! ignored; every field is optional, but numeric fields must parse.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use zip::ZipArchive;

use crate::config::normalize_extension;
use crate::error::{MigrationError, Result};

/// Well-known entry name at the archive root
pub const COMIC_INFO_ENTRY: &str = "ComicInfo.xml";

/// Containers that are read as zip archives
pub const ZIP_CONTAINER_EXTENSIONS: &[&str] = &[".cbz", ".zip"];

/// Upper bound on the document size read from an archive (1MB)
const MAX_COMIC_INFO_BYTES: u64 = 1024 * 1024;

/// Parsed ComicInfo document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComicInfo {
    pub title: Option<String>,
    pub series: Option<String>,
    pub number: Option<String>,
    pub count: Option<i64>,
    pub volume: Option<i64>,
    pub alternate_series: Option<String>,
    pub alternate_number: Option<String>,
    pub alternate_count: Option<i64>,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub writer: Option<String>,
    pub penciller: Option<String>,
    pub inker: Option<String>,
    pub colorist: Option<String>,
    pub letterer: Option<String>,
    pub cover_artist: Option<String>,
    pub editor: Option<String>,
    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub genre: Option<String>,
    pub web: Option<String>,
    pub page_count: Option<i64>,
    #[serde(rename = "LanguageISO")]
    pub language_iso: Option<String>,
    pub format: Option<String>,
    pub black_and_white: Option<String>,
    pub manga: Option<String>,
    pub characters: Option<String>,
    pub teams: Option<String>,
    pub locations: Option<String>,
    pub scan_information: Option<String>,
    pub story_arc: Option<String>,
    pub series_group: Option<String>,
    pub age_rating: Option<String>,
    pub community_rating: Option<f64>,
}

impl ComicInfo {
    /// Build from tag -> text pairs, validating numeric fields
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let text = |key: &str| fields.get(key).cloned();

        Ok(Self {
            title: text("Title"),
            series: text("Series"),
            number: text("Number"),
            count: int_field(fields, "Count")?,
            volume: int_field(fields, "Volume")?,
            alternate_series: text("AlternateSeries"),
            alternate_number: text("AlternateNumber"),
            alternate_count: int_field(fields, "AlternateCount")?,
            summary: text("Summary"),
            notes: text("Notes"),
            year: int_field(fields, "Year")?,
            month: int_field(fields, "Month")?,
            day: int_field(fields, "Day")?,
            writer: text("Writer"),
            penciller: text("Penciller"),
            inker: text("Inker"),
            colorist: text("Colorist"),
            letterer: text("Letterer"),
            cover_artist: text("CoverArtist"),
            editor: text("Editor"),
            publisher: text("Publisher"),
            imprint: text("Imprint"),
            genre: text("Genre"),
            web: text("Web"),
            page_count: int_field(fields, "PageCount")?,
            language_iso: text("LanguageISO"),
            format: text("Format"),
            black_and_white: text("BlackAndWhite"),
            manga: text("Manga"),
            characters: text("Characters"),
            teams: text("Teams"),
            locations: text("Locations"),
            scan_information: text("ScanInformation"),
            story_arc: text("StoryArc"),
            series_group: text("SeriesGroup"),
            age_rating: text("AgeRating"),
            community_rating: float_field(fields, "CommunityRating")?,
        })
    }

    /// Whether the document flags the book as manga
    pub fn is_manga(&self) -> bool {
        self.manga
            .as_deref()
            .map(|v| {
                let v = v.trim();
                v.eq_ignore_ascii_case("yes") || v.eq_ignore_ascii_case("yesandrighttoleft")
            })
            .unwrap_or(false)
    }
}

fn int_field(fields: &HashMap<String, String>, key: &str) -> Result<Option<i64>> {
    match fields.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
            MigrationError::Metadata(format!("{} is not an integer: '{}'", key, raw))
        }),
    }
}

fn float_field(fields: &HashMap<String, String>, key: &str) -> Result<Option<f64>> {
    match fields.get(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<f64>().map(Some).map_err(|_| {
            MigrationError::Metadata(format!("{} is not a number: '{}'", key, raw))
        }),
    }
}

/// Parse ComicInfo.xml content
pub fn parse_comic_info_xml(xml: &[u8]) -> Result<ComicInfo> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut fields: HashMap<String, String> = HashMap::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current_tag: Option<String> = None;
    let mut current_text = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                if depth == 1 {
                    if saw_root {
                        return Err(MigrationError::Metadata(
                            "multiple root elements".to_string(),
                        ));
                    }
                    saw_root = true;
                } else if depth == 2 {
                    current_tag = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    current_text.clear();
                }
            }
            Event::Empty(_) => {
                if depth == 0 {
                    saw_root = true;
                }
            }
            Event::Text(e) => {
                if depth == 2 {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| MigrationError::Metadata(err.to_string()))?;
                    current_text.push_str(&unescaped);
                }
            }
            Event::CData(e) => {
                if depth == 2 {
                    current_text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if depth == 2 {
                    if let Some(tag) = current_tag.take() {
                        let value = current_text.trim();
                        if !value.is_empty() {
                            fields.insert(tag, value.to_string());
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(MigrationError::Metadata("document has no root element".to_string()));
    }
    if depth != 0 {
        return Err(MigrationError::Metadata("unexpected end of document".to_string()));
    }

    ComicInfo::from_fields(&fields)
}

/// Extract and parse ComicInfo.xml from an archive.
///
/// Returns `Ok(None)` when the container type has no readable entries or the
/// entry is absent, and `Err` when the archive or document is broken.
pub fn extract_comic_info(archive_path: &Path) -> Result<Option<ComicInfo>> {
    let extension = archive_path
        .extension()
        .map(|e| normalize_extension(&e.to_string_lossy()))
        .unwrap_or_default();

    if !ZIP_CONTAINER_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(None);
    }

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let entry_name = match find_entry_name(&archive) {
        Some(name) => name,
        None => return Ok(None),
    };

    let entry = archive.by_name(&entry_name)?;
    let mut bytes = Vec::new();
    entry.take(MAX_COMIC_INFO_BYTES).read_to_end(&mut bytes)?;

    parse_comic_info_xml(&bytes).map(Some)
}

/// Exact root entry name first, then a case-insensitive match at the root
fn find_entry_name<R: Read + std::io::Seek>(archive: &ZipArchive<R>) -> Option<String> {
    archive
        .file_names()
        .find(|name| *name == COMIC_INFO_ENTRY)
        .or_else(|| {
            archive
                .file_names()
                .find(|name| name.eq_ignore_ascii_case(COMIC_INFO_ENTRY))
        })
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Write a zip archive with the given entries
    pub(crate) fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    const BATMAN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ComicInfo xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <Series>Batman</Series>
  <Number>1</Number>
  <Year>2020</Year>
  <Title>The Court of Owls &amp; More</Title>
  <Unknown>ignored</Unknown>
  <Pages><Page Image="0" /></Pages>
  <Notes></Notes>
</ComicInfo>"#;

    #[test]
    fn test_parse_basic_document() {
        let info = parse_comic_info_xml(BATMAN.as_bytes()).unwrap();
        assert_eq!(info.series.as_deref(), Some("Batman"));
        assert_eq!(info.number.as_deref(), Some("1"));
        assert_eq!(info.year, Some(2020));
        assert_eq!(info.title.as_deref(), Some("The Court of Owls & More"));
        assert!(info.notes.is_none());
        assert!(info.publisher.is_none());
        assert!(!info.is_manga());
    }

    #[test]
    fn test_manga_flag_values() {
        for value in ["Yes", "yes", "YesAndRightToLeft"] {
            let xml = format!("<ComicInfo><Manga>{}</Manga></ComicInfo>", value);
            assert!(parse_comic_info_xml(xml.as_bytes()).unwrap().is_manga());
        }
        let xml = "<ComicInfo><Manga>No</Manga></ComicInfo>";
        assert!(!parse_comic_info_xml(xml.as_bytes()).unwrap().is_manga());
    }

    #[test]
    fn test_invalid_integer_rejects_document() {
        let xml = "<ComicInfo><Series>X</Series><Year>twenty</Year></ComicInfo>";
        let err = parse_comic_info_xml(xml.as_bytes()).unwrap_err();
        assert!(matches!(err, MigrationError::Metadata(_)));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        assert!(parse_comic_info_xml(b"<ComicInfo><Series>X</Title></ComicInfo>").is_err());
        assert!(parse_comic_info_xml(b"<ComicInfo><Series>X</Series>").is_err());
        assert!(parse_comic_info_xml(b"just some text").is_err());
    }

    #[test]
    fn test_extract_from_archive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batman.cbz");
        write_archive(
            &path,
            &[("page001.jpg", b"\xff\xd8"), (COMIC_INFO_ENTRY, BATMAN.as_bytes())],
        );

        let info = extract_comic_info(&path).unwrap().unwrap();
        assert_eq!(info.series.as_deref(), Some("Batman"));
    }

    #[test]
    fn test_extract_case_insensitive_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("batman.CBZ");
        write_archive(&path, &[("comicinfo.xml", BATMAN.as_bytes())]);

        let info = extract_comic_info(&path).unwrap().unwrap();
        assert_eq!(info.year, Some(2020));
    }

    #[test]
    fn test_extract_without_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.cbz");
        write_archive(&path, &[("page001.jpg", b"\xff\xd8")]);

        assert!(extract_comic_info(&path).unwrap().is_none());
    }

    #[test]
    fn test_extract_not_a_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.cbz");
        std::fs::write(&path, b"definitely not a zip archive").unwrap();

        let err = extract_comic_info(&path).unwrap_err();
        assert!(matches!(err, MigrationError::Archive(_)));
    }

    #[test]
    fn test_non_zip_container_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.cbr");
        std::fs::write(&path, b"rar bytes").unwrap();

        assert!(extract_comic_info(&path).unwrap().is_none());
    }
}
