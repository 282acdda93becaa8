//! Manga naming: `Series/Series v01.ext`. With chapter naming enabled,
//! loose chapters without a volume become `Series/Series c012.ext`.

use std::path::{Path, PathBuf};

use super::sanitize::sanitize_or;
use super::template::{Substitutions, Template, TemplateError, Value};
use super::{issue_as_int, join_target, render_pair};
use crate::config::Settings;
use crate::metadata::{ComicMetadata, UNKNOWN_SERIES};

#[derive(Debug, Clone)]
pub struct MangaMapper {
    root: PathBuf,
    folder: Result<Template, TemplateError>,
    volume_file: Result<Template, TemplateError>,
    chapter_file: Result<Template, TemplateError>,
    chapter_naming: bool,
}

impl MangaMapper {
    pub fn new(settings: &Settings) -> Self {
        Self {
            root: settings.target_roots.manga.clone(),
            folder: Template::parse(&settings.naming.manga_folder_format),
            volume_file: Template::parse(&settings.naming.manga_volume_format),
            chapter_file: Template::parse(&settings.naming.manga_chapter_format),
            chapter_naming: settings.naming.manga_chapter_naming,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn substitutions(metadata: &ComicMetadata) -> Substitutions {
        let mut values = Substitutions::new();
        values.insert(
            "series",
            Value::from(sanitize_or(Some(metadata.series.as_str()), UNKNOWN_SERIES)),
        );
        values.insert("volume", Value::from(metadata.volume.unwrap_or(0)));
        values.insert("chapter", Value::from(issue_as_int(metadata.issue_number.as_deref())));
        values.insert(
            "year",
            Value::from(
                metadata
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "0000".to_string()),
            ),
        );
        values
    }

    pub fn calculate_path(&self, metadata: &ComicMetadata, extension: &str) -> PathBuf {
        let values = Self::substitutions(metadata);

        // With chapter naming on, a numbered chapter with no volume is named as a chapter
        let chapter_only = self.chapter_naming
            && metadata.volume.is_none()
            && matches!(values.get("chapter"), Some(Value::Int(n)) if *n > 0);
        let file = if chapter_only {
            &self.chapter_file
        } else {
            &self.volume_file
        };

        let (folder, file) = match render_pair(&self.folder, file, &values) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "Manga template unusable, using fixed layout");
                fallback_names(&values)
            }
        };

        join_target(&self.root, &folder, &file, extension)
    }
}

/// Fixed layout: `{series}` and `{series} v{volume:02d}`
fn fallback_names(values: &Substitutions) -> (String, String) {
    let series = match values.get("series") {
        Some(Value::Text(s)) => s.clone(),
        _ => UNKNOWN_SERIES.to_string(),
    };
    let volume = match values.get("volume") {
        Some(Value::Int(n)) => *n,
        _ => 0,
    };

    (series.clone(), format!("{} v{:02}", series, volume))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.target_roots.manga = PathBuf::from("/library/manga");
        settings
    }

    #[test]
    fn test_filename_metadata_maps_to_volume_zero() {
        let meta = ComicMetadata::from_filename("Vol");
        let path = MangaMapper::new(&settings()).calculate_path(&meta, ".cbz");
        assert_eq!(path, PathBuf::from("/library/manga/Vol/Vol v00.cbz"));
    }

    #[test]
    fn test_volume_padding() {
        let mut meta = ComicMetadata::from_filename("ignored");
        meta.series = "One Piece".to_string();
        meta.volume = Some(3);
        meta.issue_number = Some("25".to_string());

        let path = MangaMapper::new(&settings()).calculate_path(&meta, ".cbr");
        assert_eq!(path, PathBuf::from("/library/manga/One Piece/One Piece v03.cbr"));
    }

    #[test]
    fn test_chapter_without_volume_uses_volume_format_by_default() {
        let mut meta = ComicMetadata::from_filename("Berserk");
        meta.issue_number = Some("12".to_string());

        let path = MangaMapper::new(&settings()).calculate_path(&meta, ".cbz");
        assert_eq!(path, PathBuf::from("/library/manga/Berserk/Berserk v00.cbz"));
    }

    #[test]
    fn test_chapter_naming_enabled() {
        let mut settings = settings();
        settings.naming.manga_chapter_naming = true;
        let mapper = MangaMapper::new(&settings);

        let mut meta = ComicMetadata::from_filename("Berserk");
        meta.issue_number = Some("12".to_string());
        assert_eq!(
            mapper.calculate_path(&meta, ".cbz"),
            PathBuf::from("/library/manga/Berserk/Berserk c012.cbz")
        );

        // A known volume still wins
        meta.volume = Some(3);
        assert_eq!(
            mapper.calculate_path(&meta, ".cbz"),
            PathBuf::from("/library/manga/Berserk/Berserk v03.cbz")
        );
    }

    #[test]
    fn test_unknown_key_uses_fixed_layout() {
        let mut settings = settings();
        settings.naming.manga_folder_format = "{author}/{series}".to_string();

        let mut meta = ComicMetadata::from_filename("Akira");
        meta.volume = Some(2);

        let path = MangaMapper::new(&settings).calculate_path(&meta, ".cbz");
        assert_eq!(path, PathBuf::from("/library/manga/Akira/Akira v02.cbz"));
    }

    #[test]
    fn test_sanitized_series() {
        let meta = ComicMetadata::from_filename("Dr. Stone: Reboot?");
        let path = MangaMapper::new(&settings()).calculate_path(&meta, ".cbz");
        assert_eq!(
            path,
            PathBuf::from("/library/manga/Dr. Stone Reboot/Dr. Stone Reboot v00.cbz")
        );
    }
}
