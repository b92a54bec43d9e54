//! Reconciliation engine: one fetch-and-merge pass at a time.
//!
//! The engine owns the pending relationship map and the per-zone cursors. It
//! never owns storage: it mutates the bound [`EntityStore`] and commits it at
//! the end of each pass.

use crate::cloud::RemoteChangeSource;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::mapper::{MapOutcome, RecordMapper};
use crate::pending::PendingRelationshipTracker;
use crate::record::{RecordDeletion, Zone, ZoneChanges};
use std::collections::HashMap;
use std::sync::Arc;
use stowage_storage::{EntityStore, StorageResult};
use stowage_types::{CategoryId, EntityKind, ItemId, LocationId};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Counters for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Change batches fetched.
    pub batches: usize,
    /// Records mapped onto entities.
    pub applied: usize,
    /// Malformed records skipped.
    pub skipped: usize,
    /// Entities removed by record deletions.
    pub deleted: usize,
    /// Zones purged because they were deleted remotely.
    pub zones_purged: usize,
    /// References linked onto items.
    pub linked: usize,
    /// Pending relationship entries left at the end of the pass.
    pub pending: usize,
    /// Set when the final commit failed; the changes stay in memory.
    pub commit_error: Option<String>,
}

/// Pulls remote changes and merges them into the local store.
pub struct ReconciliationEngine<S: EntityStore> {
    config: SyncConfig,
    source: Arc<dyn RemoteChangeSource>,
    store: S,
    mapper: RecordMapper,
    pending: PendingRelationshipTracker,
    cursors: HashMap<Zone, String>,
    /// Record names whose entity identity came from an identity field.
    aliases: HashMap<(Zone, String), Uuid>,
}

impl<S: EntityStore> ReconciliationEngine<S> {
    pub fn new(source: Arc<dyn RemoteChangeSource>, store: S, config: SyncConfig) -> Self {
        Self {
            config,
            source,
            store,
            mapper: RecordMapper::new(),
            pending: PendingRelationshipTracker::new(),
            cursors: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn source(&self) -> &Arc<dyn RemoteChangeSource> {
        &self.source
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Replaces the bound store, returning the previous one.
    ///
    /// Pending relationships are keyed by identity and carry over.
    pub fn rebind_store(&mut self, store: S) -> S {
        info!("Rebinding local store");
        std::mem::replace(&mut self.store, store)
    }

    pub fn pending(&self) -> &PendingRelationshipTracker {
        &self.pending
    }

    pub fn cursor(&self, zone: Zone) -> Option<&str> {
        self.cursors.get(&zone).map(String::as_str)
    }

    /// Sets or clears a zone's resumption cursor (for callers that persist
    /// cursors across launches).
    pub fn set_cursor(&mut self, zone: Zone, cursor: Option<String>) {
        match cursor {
            Some(c) => self.cursors.insert(zone, c),
            None => self.cursors.remove(&zone),
        };
    }

    /// Runs one full fetch → map → resolve → commit cycle.
    ///
    /// A fetch failure ends the pass with an error; changes already merged
    /// stay in the store and are committed by the next successful pass.
    pub async fn run_pass(&mut self) -> SyncResult<PassReport> {
        let mut report = PassReport::default();
        let zones = self.config.zones.clone();

        for zone in zones {
            loop {
                let cursor = self.cursors.get(&zone).cloned();
                let changes = self
                    .source
                    .fetch_changes(zone, cursor.as_deref())
                    .await?;
                let more_coming = changes.more_coming;
                report.batches += 1;
                self.apply_changes(changes, &mut report)?;
                if !more_coming {
                    break;
                }
            }
        }

        self.finish_pass(&mut report)?;
        info!(
            "Sync pass finished: {} applied, {} skipped, {} deleted, {} linked, {} pending",
            report.applied, report.skipped, report.deleted, report.linked, report.pending
        );
        Ok(report)
    }

    /// Merges one fetched batch into the store.
    pub fn apply_changes(
        &mut self,
        changes: ZoneChanges,
        report: &mut PassReport,
    ) -> StorageResult<()> {
        let zone = changes.zone;

        if changes.zone_deleted {
            self.purge_zone(zone)?;
            report.zones_purged += 1;
            return Ok(());
        }

        let mut touched_items = Vec::new();
        for record in &changes.modified {
            if Zone::for_kind(record.kind) != zone {
                debug!(
                    "Record {} of kind {} delivered in zone {}",
                    record.record_name, record.kind, zone
                );
            }
            match self.mapper.apply(record, &mut self.store)? {
                MapOutcome::Skipped(_) => report.skipped += 1,
                outcome => {
                    report.applied += 1;
                    if let Some(uuid) = outcome.identity() {
                        self.remember_alias(Zone::for_kind(record.kind), &record.record_name, uuid);
                    }
                    if let MapOutcome::Item { id, desired, .. } = outcome {
                        self.pending.stage(id, desired.location, desired.category);
                        touched_items.push(id);
                    }
                }
            }
        }

        // Same-batch fast path; the resolve at the end of the pass is the
        // authoritative one.
        if !touched_items.is_empty() {
            let fast = self.pending.resolve_items(&touched_items, &mut self.store)?;
            report.linked += fast.linked;
        }

        for deletion in &changes.deleted {
            if self.apply_deletion(deletion)? {
                report.deleted += 1;
            }
        }

        if let Some(cursor) = changes.next_cursor {
            self.cursors.insert(zone, cursor);
        }
        Ok(())
    }

    /// Resolves what is still pending and commits the store.
    pub fn finish_pass(&mut self, report: &mut PassReport) -> StorageResult<()> {
        let resolved = self.pending.resolve(&mut self.store)?;
        report.linked += resolved.linked;
        report.pending = resolved.remaining;

        if let Err(e) = self.store.commit() {
            warn!("Failed to commit local store, will retry next pass: {}", e);
            report.commit_error = Some(e.to_string());
        }
        Ok(())
    }

    fn remember_alias(&mut self, zone: Zone, record_name: &str, uuid: Uuid) {
        let matches_name = Uuid::parse_str(record_name).is_ok_and(|n| n == uuid);
        if !matches_name {
            self.aliases.insert((zone, record_name.to_string()), uuid);
        }
    }

    /// Deletes the entity a deletion names. Returns true if one was removed.
    fn apply_deletion(&mut self, deletion: &RecordDeletion) -> StorageResult<bool> {
        let key = (deletion.zone, deletion.record_name.clone());
        let uuid = match self.aliases.remove(&key) {
            Some(uuid) => uuid,
            None => match Uuid::parse_str(&deletion.record_name) {
                Ok(uuid) => uuid,
                Err(_) => {
                    warn!(
                        "Ignoring deletion of unknown record {} in zone {}",
                        deletion.record_name, deletion.zone
                    );
                    return Ok(false);
                }
            },
        };

        let removed = match deletion.zone.kind() {
            EntityKind::Item => {
                let id = ItemId::from_uuid(uuid);
                self.pending.evict(&id);
                self.store.delete_item(&id)?
            }
            EntityKind::Location => self.store.delete_location(&LocationId::from_uuid(uuid))?,
            EntityKind::Category => self.store.delete_category(&CategoryId::from_uuid(uuid))?,
        };

        if removed {
            debug!("Deleted {} {}", deletion.zone.kind(), uuid);
        }
        Ok(removed)
    }

    /// Removes every local entity of the zone's kind.
    fn purge_zone(&mut self, zone: Zone) -> StorageResult<()> {
        let kind = zone.kind();
        let removed = self.store.delete_all(kind)?;
        if kind == EntityKind::Item {
            self.pending.clear();
        }
        self.aliases.retain(|(z, _), _| *z != zone);
        self.cursors.remove(&zone);
        warn!("Zone {} was deleted remotely; purged {} local {}(s)", zone, removed, kind);
        Ok(())
    }
}
