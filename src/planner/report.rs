//! JSON plan report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::action::{MigrationAction, PlanSummary};
use crate::error::Result;

/// Serialized plan: summary block plus every action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    pub summary: PlanSummary,
    pub actions: Vec<MigrationAction>,
}

impl PlanReport {
    pub fn new(actions: Vec<MigrationAction>) -> Self {
        Self {
            generated_at: Utc::now(),
            summary: PlanSummary::from_actions(&actions),
            actions,
        }
    }

    /// Write pretty JSON, creating parent directories
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;

        tracing::info!(path = %path.display(), actions = self.actions.len(), "Wrote plan report");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
