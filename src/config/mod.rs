//! Settings Module
//!
//! The pipeline consumes a fully validated `Settings` value. Loading from a
//! TOML file and environment substitution live here so that nothing below
//! the binary ever parses raw configuration.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MigrationError, Result};
use crate::metadata::ContentType;

/// Extensions scanned when the settings file does not list any
pub const DEFAULT_EXTENSIONS: &[&str] = &[".cbz", ".cbr", ".cb7", ".pdf", ".epub"];

/// Default read size for fingerprinting (64KB)
pub const DEFAULT_HASH_CHUNK_SIZE: usize = 64 * 1024;

static ENV_VAR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{?([A-Za-z_][A-Za-z0-9_]*)\}?").expect("valid env var pattern")
});

/// Target root directory for each content type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TargetRoots {
    pub western: PathBuf,
    pub manga: PathBuf,
    pub hentai: PathBuf,
}

impl Default for TargetRoots {
    fn default() -> Self {
        Self {
            western: PathBuf::from("library/comics"),
            manga: PathBuf::from("library/manga"),
            hentai: PathBuf::from("library/hentai"),
        }
    }
}

impl TargetRoots {
    pub fn for_content_type(&self, content_type: ContentType) -> &Path {
        match content_type {
            ContentType::Western => &self.western,
            ContentType::Manga => &self.manga,
            ContentType::Hentai => &self.hentai,
        }
    }
}

/// Naming templates per content type.
///
/// Placeholders use `{key}` or `{key:0Nd}` for zero-padded integers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NamingTemplates {
    pub western_format: String,
    pub western_folder_format: String,
    pub manga_volume_format: String,
    pub manga_chapter_format: String,
    /// Name loose chapters (issue number, no volume) with
    /// `manga_chapter_format` instead of the volume format
    pub manga_chapter_naming: bool,
    pub manga_folder_format: String,
    pub hentai_oneshot_format: String,
    pub hentai_series_format: String,
    pub hentai_folder_format: String,
}

impl Default for NamingTemplates {
    fn default() -> Self {
        Self {
            western_format: "{series} ({year}) #{issue:03d} ({date})".to_string(),
            western_folder_format: "{publisher}/{series} ({start_year})".to_string(),
            manga_volume_format: "{series} v{volume:02d}".to_string(),
            manga_chapter_format: "{series} c{chapter:03d}".to_string(),
            manga_chapter_naming: false,
            manga_folder_format: "{series}".to_string(),
            hentai_oneshot_format: "({id}) - {title} ({language}) [{source}]".to_string(),
            hentai_series_format: "{title} v{volume:02d}".to_string(),
            hentai_folder_format: "[{circle}]/{title}".to_string(),
        }
    }
}

/// Logging output settings, consumed by `LoggingContext`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when RUST_LOG is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json: bool,
    /// Optional directory for a per-run log file
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            directory: None,
        }
    }
}

/// Worker pool sizes. Accepted for forward compatibility; the pipeline
/// currently runs on a single thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PerformanceSettings {
    pub max_hash_workers: usize,
    pub max_copy_workers: usize,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            max_hash_workers: 4,
            max_copy_workers: 2,
        }
    }
}

/// Validated settings consumed by the migration pipeline
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Extension allow-list (lowercase, leading dot)
    pub extensions: Vec<String>,
    pub target_roots: TargetRoots,
    pub naming: NamingTemplates,
    /// Path substrings that mark a file as manga
    pub manga_path_markers: Vec<String>,
    /// Relative path prefix -> forced content type
    pub content_type_overrides: BTreeMap<String, ContentType>,
    /// Append-only JSON lines log of executed operations
    pub undo_log_path: PathBuf,
    pub hash_chunk_size: usize,
    /// Re-fingerprint targets after copy/move
    pub verify_copy_integrity: bool,
    pub performance: PerformanceSettings,
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            target_roots: TargetRoots::default(),
            naming: NamingTemplates::default(),
            manga_path_markers: vec!["manga".to_string()],
            content_type_overrides: BTreeMap::new(),
            undo_log_path: default_undo_log_path(),
            hash_chunk_size: DEFAULT_HASH_CHUNK_SIZE,
            verify_copy_integrity: true,
            performance: PerformanceSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Default undo log location (~/.config/comic-migrator/undo_log.jsonl)
fn default_undo_log_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("comic-migrator")
        .join("undo_log.jsonl")
}

impl Settings {
    /// Load settings from a TOML file, substituting `${VAR}` / `$VAR`
    /// references from the environment, then validate.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            MigrationError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let expanded = substitute_env_vars(raw);
        let mut settings: Settings = toml::from_str(&expanded)?;
        settings.normalize();
        settings.validate()?;
        Ok(settings)
    }

    /// Normalize extensions to lowercase with a leading dot
    pub fn normalize(&mut self) {
        self.extensions = self
            .extensions
            .iter()
            .map(|ext| normalize_extension(ext))
            .filter(|ext| ext.len() > 1)
            .collect();
        self.extensions.sort();
        self.extensions.dedup();

        self.manga_path_markers = self
            .manga_path_markers
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(MigrationError::Config(
                "extension allow-list must not be empty".to_string(),
            ));
        }

        if self.hash_chunk_size == 0 {
            return Err(MigrationError::Config(
                "hash_chunk_size must be greater than zero".to_string(),
            ));
        }

        let roots = [
            ("western", &self.target_roots.western),
            ("manga", &self.target_roots.manga),
            ("hentai", &self.target_roots.hentai),
        ];
        for (name, root) in roots {
            if root.as_os_str().is_empty() {
                return Err(MigrationError::Config(format!(
                    "target root for {} must not be empty",
                    name
                )));
            }
        }

        let templates = [
            ("western_format", &self.naming.western_format),
            ("western_folder_format", &self.naming.western_folder_format),
            ("manga_volume_format", &self.naming.manga_volume_format),
            ("manga_folder_format", &self.naming.manga_folder_format),
        ];
        for (name, template) in templates {
            if template.trim().is_empty() {
                return Err(MigrationError::Config(format!(
                    "naming template {} must not be empty",
                    name
                )));
            }
        }

        if self.undo_log_path.as_os_str().is_empty() {
            return Err(MigrationError::Config(
                "undo_log_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether a file extension is in the allow-list (case-insensitive)
    pub fn allows_extension(&self, extension: &str) -> bool {
        let ext = normalize_extension(extension);
        self.extensions.iter().any(|e| *e == ext)
    }
}

/// Lowercase an extension and ensure a leading dot
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().to_lowercase();
    if trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{}", trimmed)
    }
}

/// Replace `${VAR}` and `$VAR` with environment values.
/// Unset variables are left as written.
fn substitute_env_vars(raw: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(raw, |caps: &Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}
