//! Western comic naming: `Publisher/Series (Year)/Series (Year) #001 (Date).ext`

use std::path::{Path, PathBuf};

use super::sanitize::{sanitize_or, sanitize_segment};
use super::template::{Substitutions, Template, TemplateError, Value};
use super::{issue_as_int, join_target, render_pair};
use crate::config::Settings;
use crate::metadata::{ComicMetadata, UNKNOWN_SERIES};

pub const UNKNOWN_PUBLISHER: &str = "Unknown Publisher";

#[derive(Debug, Clone)]
pub struct WesternMapper {
    root: PathBuf,
    folder: Result<Template, TemplateError>,
    file: Result<Template, TemplateError>,
}

impl WesternMapper {
    pub fn new(settings: &Settings) -> Self {
        Self {
            root: settings.target_roots.western.clone(),
            folder: Template::parse(&settings.naming.western_folder_format),
            file: Template::parse(&settings.naming.western_format),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Substitution set for one record
    pub fn substitutions(metadata: &ComicMetadata) -> Substitutions {
        let year = year_text(metadata.year);

        let mut values = Substitutions::new();
        values.insert(
            "publisher",
            Value::from(sanitize_or(metadata.publisher.as_deref(), UNKNOWN_PUBLISHER)),
        );
        values.insert(
            "series",
            Value::from(sanitize_or(Some(metadata.series.as_str()), UNKNOWN_SERIES)),
        );
        values.insert("start_year", Value::from(year.clone()));
        values.insert("year", Value::from(year));
        values.insert("issue", Value::from(issue_as_int(metadata.issue_number.as_deref())));
        values.insert("date", Value::from(date_text(metadata)));
        values.insert(
            "title",
            Value::from(metadata.title.as_deref().map(sanitize_segment).unwrap_or_default()),
        );
        values
    }

    pub fn calculate_path(&self, metadata: &ComicMetadata, extension: &str) -> PathBuf {
        let values = Self::substitutions(metadata);

        let rendered = render_pair(&self.folder, &self.file, &values);

        let (folder, file) = match rendered {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(error = %e, "Western template unusable, using fixed layout");
                fallback_names(&values)
            }
        };

        join_target(&self.root, &folder, &file, extension)
    }
}

/// Fixed layout: `{publisher}/{series} ({start_year})` and `{series} #{issue:03d}`
fn fallback_names(values: &Substitutions) -> (String, String) {
    let text = |key: &str| match values.get(key) {
        Some(Value::Text(s)) => s.clone(),
        Some(Value::Int(n)) => n.to_string(),
        None => String::new(),
    };
    let issue = match values.get("issue") {
        Some(Value::Int(n)) => *n,
        _ => 0,
    };

    (
        format!("{}/{} ({})", text("publisher"), text("series"), text("start_year")),
        format!("{} #{:03}", text("series"), issue),
    )
}

fn year_text(year: Option<i64>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "0000".to_string())
}

/// Most precise known publication date
fn date_text(metadata: &ComicMetadata) -> String {
    match (metadata.year, metadata.month, metadata.day) {
        (Some(y), Some(m), Some(d)) => format!("{}-{:02}-{:02}", y, m, d),
        (Some(y), Some(m), None) => format!("{}-{:02}", y, m),
        (Some(y), _, _) => y.to_string(),
        _ => "0000-00-00".to_string(),
    }
}
