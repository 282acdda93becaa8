//! Plan entries and their summary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::metadata::Provenance;

/// Terminal planning decision for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    /// Approved for execution
    Copy,
    /// Target already exists on disk
    Skip,
    /// Target already claimed by an earlier file in this plan
    Conflict,
    /// The file could not be planned
    Error,
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionStatus::Copy => "COPY",
            ActionStatus::Skip => "SKIP",
            ActionStatus::Conflict => "CONFLICT",
            ActionStatus::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Reason recorded for SKIP actions
pub const TARGET_EXISTS_REASON: &str = "target already exists";

/// One planned migration decision.
///
/// Built only through the status constructors, which enforce that every
/// non-COPY action carries a reason and only ERROR may lack a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationAction {
    source_path: PathBuf,
    target_path: Option<PathBuf>,
    status: ActionStatus,
    reason: Option<String>,
    metadata_source: Option<Provenance>,
    file_size: u64,
}

impl MigrationAction {
    pub fn copy(source: PathBuf, target: PathBuf, provenance: Provenance, file_size: u64) -> Self {
        Self {
            source_path: source,
            target_path: Some(target),
            status: ActionStatus::Copy,
            reason: None,
            metadata_source: Some(provenance),
            file_size,
        }
    }

    pub fn skip(source: PathBuf, target: PathBuf, provenance: Provenance, file_size: u64) -> Self {
        Self {
            source_path: source,
            target_path: Some(target),
            status: ActionStatus::Skip,
            reason: Some(TARGET_EXISTS_REASON.to_string()),
            metadata_source: Some(provenance),
            file_size,
        }
    }

    /// Conflict with the source that reserved `target` first
    pub fn conflict(
        source: PathBuf,
        target: PathBuf,
        claimed_by: &Path,
        provenance: Provenance,
        file_size: u64,
    ) -> Self {
        Self {
            source_path: source,
            target_path: Some(target),
            status: ActionStatus::Conflict,
            reason: Some(format!("target already claimed by {}", claimed_by.display())),
            metadata_source: Some(provenance),
            file_size,
        }
    }

    pub fn error(
        source: PathBuf,
        reason: impl Into<String>,
        provenance: Option<Provenance>,
        file_size: u64,
    ) -> Self {
        Self {
            source_path: source,
            target_path: None,
            status: ActionStatus::Error,
            reason: Some(reason.into()),
            metadata_source: provenance,
            file_size,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Target path; `None` only for ERROR actions
    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn metadata_source(&self) -> Option<Provenance> {
        self.metadata_source
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn is_approved(&self) -> bool {
        self.status == ActionStatus::Copy
    }
}

/// COPY actions in plan order, truncated to `limit` when given
pub fn approved_actions(actions: &[MigrationAction], limit: Option<usize>) -> Vec<MigrationAction> {
    actions
        .iter()
        .filter(|a| a.is_approved())
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect()
}

/// Counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total: usize,
    pub copy: usize,
    pub skip: usize,
    pub conflict: usize,
    pub error: usize,
    /// Bytes covered by COPY actions
    pub copy_bytes: u64,
}

impl PlanSummary {
    pub fn from_actions(actions: &[MigrationAction]) -> Self {
        let mut summary = Self::default();
        for action in actions {
            summary.total += 1;
            match action.status() {
                ActionStatus::Copy => {
                    summary.copy += 1;
                    summary.copy_bytes += action.file_size();
                }
                ActionStatus::Skip => summary.skip += 1,
                ActionStatus::Conflict => summary.conflict += 1,
                ActionStatus::Error => summary.error += 1,
            }
        }
        summary
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Plan summary")?;
        writeln!(f, "  total:    {:>6}", self.total)?;
        writeln!(f, "  copy:     {:>6}  ({} bytes)", self.copy, self.copy_bytes)?;
        writeln!(f, "  skip:     {:>6}", self.skip)?;
        writeln!(f, "  conflict: {:>6}", self.conflict)?;
        write!(f, "  error:    {:>6}", self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<MigrationAction> {
        vec![
            MigrationAction::copy("a.cbz".into(), "out/A.cbz".into(), Provenance::Embedded, 10),
            MigrationAction::conflict(
                "b.cbz".into(),
                "out/A.cbz".into(),
                Path::new("a.cbz"),
                Provenance::Filename,
                20,
            ),
            MigrationAction::skip("c.cbz".into(), "out/C.cbz".into(), Provenance::Filename, 30),
            MigrationAction::error("d.cbz".into(), "No mapper for content type hentai", None, 40),
            MigrationAction::copy("e.cbz".into(), "out/E.cbz".into(), Provenance::Filename, 50),
        ]
    }

    #[test]
    fn test_reasons_present_for_non_copy() {
        for action in sample() {
            assert_eq!(action.reason().is_none(), action.status() == ActionStatus::Copy);
        }
        let conflict = &sample()[1];
        assert!(conflict.reason().unwrap().contains("a.cbz"));
        assert_eq!(sample()[2].reason(), Some(TARGET_EXISTS_REASON));
        assert!(sample()[3].target_path().is_none());
    }

    #[test]
    fn test_summary_counts() {
        let summary = PlanSummary::from_actions(&sample());
        assert_eq!(summary.total, 5);
        assert_eq!(summary.copy, 2);
        assert_eq!(summary.skip, 1);
        assert_eq!(summary.conflict, 1);
        assert_eq!(summary.error, 1);
        assert_eq!(summary.copy_bytes, 60);
        assert!(summary.to_string().contains("conflict:      1"));
    }

    #[test]
    fn test_approved_actions_limit() {
        let actions = sample();
        assert_eq!(approved_actions(&actions, None).len(), 2);

        let limited = approved_actions(&actions, Some(1));
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].source_path(), Path::new("a.cbz"));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(&sample()[1]).unwrap();
        assert_eq!(json["status"], "CONFLICT");
        assert_eq!(json["metadataSource"], "filename");
        assert_eq!(json["targetPath"], "out/A.cbz");
    }
}
