//! Migration Simulator
//!
//! Builds the plan: one `MigrationAction` per scanned file, in scanner
//! order, without touching the filesystem beyond existence checks.
//!
//! Collision precedence per file:
//! 1. target exists on disk -> SKIP
//! 2. target reserved earlier in this plan -> CONFLICT
//! 3. otherwise reserve it -> COPY
//!
//! A file that cannot be planned becomes an ERROR action; the batch
//! always continues.

use std::collections::HashMap;
use std::path::Path;

use super::action::MigrationAction;
use super::reservation::{Reservation, ReservationMap};
use crate::config::Settings;
use crate::error::{MigrationError, Result};
use crate::inventory::{FileRecord, InventoryScanner};
use crate::mapper::{select_mapper, PathMapper};
use crate::metadata::{ContentType, MetadataResolver};

/// Plans migrations for scanned records
#[derive(Debug, Clone)]
pub struct Planner {
    resolver: MetadataResolver,
    mappers: HashMap<ContentType, PathMapper>,
    scanner: InventoryScanner,
}

impl Planner {
    pub fn new(settings: &Settings) -> Self {
        let mappers = [ContentType::Western, ContentType::Manga, ContentType::Hentai]
            .into_iter()
            .filter_map(|ct| select_mapper(ct, settings).map(|m| (ct, m)))
            .collect();

        Self {
            resolver: MetadataResolver::from_settings(settings),
            mappers,
            scanner: InventoryScanner::from_settings(settings),
        }
    }

    /// Scan `root` and plan every discovered file.
    ///
    /// Fails only when the root itself cannot be scanned.
    pub fn simulate(&self, root: &Path) -> Result<Vec<MigrationAction>> {
        tracing::info!(root = %root.display(), "Starting simulation");
        let inventory = self.scanner.scan(root)?;
        Ok(self.plan(&inventory.records))
    }

    /// Plan records with a fresh reservation map
    pub fn plan(&self, records: &[FileRecord]) -> Vec<MigrationAction> {
        let mut reservations = ReservationMap::new();
        self.plan_with(records, &mut reservations)
    }

    /// Plan records against a caller-owned reservation map
    pub fn plan_with(
        &self,
        records: &[FileRecord],
        reservations: &mut ReservationMap,
    ) -> Vec<MigrationAction> {
        let actions: Vec<MigrationAction> = records
            .iter()
            .map(|record| self.plan_record(record, reservations))
            .collect();

        tracing::info!(
            files = records.len(),
            reserved = reservations.len(),
            "Simulation complete"
        );
        actions
    }

    /// Decide the action for one record
    fn plan_record(&self, record: &FileRecord, reservations: &mut ReservationMap) -> MigrationAction {
        let resolution = self.resolver.resolve(record);
        let provenance = resolution.metadata.provenance;

        let mapper = match self.mappers.get(&resolution.content_type) {
            Some(mapper) => mapper,
            None => {
                tracing::warn!(
                    source = %record.path.display(),
                    content_type = %resolution.content_type,
                    "No mapper for content type"
                );
                return MigrationAction::error(
                    record.path.clone(),
                    format!("No mapper for content type {}", resolution.content_type),
                    Some(provenance),
                    record.size_bytes,
                );
            }
        };

        let target = mapper.calculate_path(&resolution.metadata, &record.suffix());

        match target_exists(&target) {
            Ok(true) => {
                tracing::debug!(destination = %target.display(), "Target exists, skipping");
                MigrationAction::skip(record.path.clone(), target, provenance, record.size_bytes)
            }
            Ok(false) => match reservations.reserve(&target, &record.path) {
                Reservation::Reserved => MigrationAction::copy(
                    record.path.clone(),
                    target,
                    provenance,
                    record.size_bytes,
                ),
                Reservation::Taken(holder) => {
                    tracing::debug!(
                        destination = %target.display(),
                        holder = %holder.display(),
                        "Target already claimed"
                    );
                    MigrationAction::conflict(
                        record.path.clone(),
                        target,
                        &holder,
                        provenance,
                        record.size_bytes,
                    )
                }
            },
            Err(e) => {
                tracing::error!(
                    source = %record.path.display(),
                    error = %e,
                    "Error processing file"
                );
                MigrationAction::error(
                    record.path.clone(),
                    e.to_string(),
                    Some(provenance),
                    record.size_bytes,
                )
            }
        }
    }
}

fn target_exists(target: &Path) -> Result<bool> {
    target.try_exists().map_err(|e| {
        MigrationError::Io(std::io::Error::new(
            e.kind(),
            format!("Cannot check target {}: {}", target.display(), e),
        ))
    })
}
