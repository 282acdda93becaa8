//! Logging setup.
//!
//! A `LoggingContext` is built once by the binary and decides where
//! tracing output goes. Library code only emits `tracing` events; it never
//! installs a subscriber or checks a global "initialized" flag.

use chrono::Utc;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::config::LoggingSettings;
use crate::error::{MigrationError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logging configuration resolved for one process
#[derive(Debug, Clone)]
pub struct LoggingContext {
    settings: LoggingSettings,
    log_file: Option<PathBuf>,
}

impl LoggingContext {
    /// Resolve settings into a context. Creates the log directory if one is
    /// configured, but installs nothing yet.
    pub fn new(settings: LoggingSettings) -> Result<Self> {
        let log_file = match &settings.directory {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                let stamp = Utc::now().format("%Y%m%d_%H%M%S");
                Some(dir.join(format!("comic-migrator_{}.log", stamp)))
            }
            None => None,
        };

        Ok(Self { settings, log_file })
    }

    /// Path of the per-run log file, if file output is enabled
    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Build a dispatcher for this context.
    ///
    /// RUST_LOG takes precedence over the configured level.
    pub fn build_dispatch(&self) -> Result<Dispatch> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.settings.level))
            .map_err(|e| {
                MigrationError::Config(format!(
                    "Invalid log level '{}': {}",
                    self.settings.level, e
                ))
            })?;

        let mut layers: Vec<BoxedLayer> = Vec::new();
        layers.push(self.console_layer());

        if let Some(path) = &self.log_file {
            let file = File::create(path)?;
            let writer = Mutex::new(file);
            let layer: BoxedLayer = if self.settings.json {
                fmt::layer().json().with_ansi(false).with_writer(writer).boxed()
            } else {
                fmt::layer().with_ansi(false).with_writer(writer).boxed()
            };
            layers.push(layer);
        }

        let subscriber = Registry::default().with(layers).with(filter);
        Ok(Dispatch::new(subscriber))
    }

    /// Install this context as the process-wide subscriber
    pub fn init(&self) -> Result<()> {
        let dispatch = self.build_dispatch()?;
        tracing::dispatcher::set_global_default(dispatch).map_err(|e| {
            MigrationError::Config(format!("Logging already initialized: {}", e))
        })?;

        tracing::debug!(
            level = %self.settings.level,
            json = self.settings.json,
            log_file = ?self.log_file,
            "Logging initialized"
        );
        Ok(())
    }

    /// Run `f` with this context as the subscriber for the current thread only
    pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> Result<T> {
        let dispatch = self.build_dispatch()?;
        Ok(tracing::dispatcher::with_default(&dispatch, f))
    }

    /// Whether any global subscriber has been installed
    pub fn is_active() -> bool {
        tracing::dispatcher::has_been_set()
    }

    fn console_layer(&self) -> BoxedLayer {
        if self.settings.json {
            fmt::layer().json().with_writer(std::io::stderr).boxed()
        } else {
            fmt::layer().with_writer(std::io::stderr).boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_created_in_directory() {
        let dir = TempDir::new().unwrap();
        let settings = LoggingSettings {
            level: "debug".to_string(),
            json: true,
            directory: Some(dir.path().join("logs")),
        };

        let ctx = LoggingContext::new(settings).unwrap();
        let log_file = ctx.log_file().unwrap().clone();
        assert!(log_file.starts_with(dir.path().join("logs")));

        ctx.scoped(|| tracing::error!(phase = "test", "hello from test"))
            .unwrap();

        let contents = fs::read_to_string(&log_file).unwrap();
        assert!(contents.contains("hello from test"));
    }

    #[test]
    fn test_no_file_without_directory() {
        let ctx = LoggingContext::new(LoggingSettings::default()).unwrap();
        assert!(ctx.log_file().is_none());
        assert!(ctx.build_dispatch().is_ok());
    }
}
