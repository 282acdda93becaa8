//! Path mapping: metadata + content type + extension -> target path.
//!
//! Each supported content type has one mapper variant. Selection is a
//! closed match over `ContentType`; a type without a variant yields `None`
//! so the planner can surface it as an ERROR action.

mod manga;
mod sanitize;
mod template;
mod western;

pub use manga::MangaMapper;
pub use sanitize::{sanitize_or, sanitize_segment};
pub use template::{Substitutions, Template, TemplateError, Value};
pub use western::{WesternMapper, UNKNOWN_PUBLISHER};

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::metadata::{ComicMetadata, ContentType};

/// Mapper for one content type
#[derive(Debug, Clone)]
pub enum PathMapper {
    Western(WesternMapper),
    Manga(MangaMapper),
}

impl PathMapper {
    /// Target path for a record. Never fails: unusable templates fall back
    /// to the fixed layout of the variant.
    pub fn calculate_path(&self, metadata: &ComicMetadata, extension: &str) -> PathBuf {
        match self {
            PathMapper::Western(mapper) => mapper.calculate_path(metadata, extension),
            PathMapper::Manga(mapper) => mapper.calculate_path(metadata, extension),
        }
    }

    /// Root directory this mapper writes under
    pub fn root(&self) -> &Path {
        match self {
            PathMapper::Western(mapper) => mapper.root(),
            PathMapper::Manga(mapper) => mapper.root(),
        }
    }
}

/// Mapper for a content type, or `None` when the type has no naming scheme
pub fn select_mapper(content_type: ContentType, settings: &Settings) -> Option<PathMapper> {
    match content_type {
        ContentType::Western => Some(PathMapper::Western(WesternMapper::new(settings))),
        ContentType::Manga => Some(PathMapper::Manga(MangaMapper::new(settings))),
        ContentType::Hentai => None,
    }
}

/// Issue/chapter number as an integer; 0 when absent or not all digits
pub(crate) fn issue_as_int(issue: Option<&str>) -> i64 {
    match issue.map(str::trim) {
        Some(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
            s.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

/// Render folder and file templates, failing if either is unusable
pub(crate) fn render_pair(
    folder: &Result<Template, TemplateError>,
    file: &Result<Template, TemplateError>,
    values: &Substitutions,
) -> Result<(String, String), TemplateError> {
    let folder = folder.as_ref().map_err(Clone::clone)?;
    let file = file.as_ref().map_err(Clone::clone)?;

    // Check both before rendering either
    folder.validate(values)?;
    file.validate(values)?;

    Ok((folder.render(values)?, file.render(values)?))
}

/// `root/folder/file+extension`
pub(crate) fn join_target(root: &Path, folder: &str, file: &str, extension: &str) -> PathBuf {
    root.join(folder).join(format!("{}{}", file, extension))
}
