#![allow(dead_code)]

use std::sync::Arc;
use stowage_storage::MemoryStore;
use stowage_sync::{
    fields, CloudRecord, MemoryChangeSource, RecordDeletion, ReconciliationEngine, SyncConfig,
    Zone, ZoneChanges,
};
use stowage_types::EntityKind;
use uuid::Uuid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ── Records ──────────────────────────────────────────────────────

pub fn item_record(id: Uuid, name: &str, quantity: i64) -> CloudRecord {
    CloudRecord::new(EntityKind::Item, id.to_string())
        .with_field(fields::NAME, name)
        .with_field(fields::QUANTITY, quantity)
}

pub fn item_record_at(id: Uuid, name: &str, quantity: i64, location: Uuid) -> CloudRecord {
    item_record(id, name, quantity)
        .with_field(fields::LOCATION_ID, stowage_sync::FieldValue::reference(location))
}

pub fn location_record(id: Uuid, name: &str) -> CloudRecord {
    CloudRecord::new(EntityKind::Location, id.to_string()).with_field(fields::NAME, name)
}

pub fn category_record(id: Uuid, name: &str) -> CloudRecord {
    CloudRecord::new(EntityKind::Category, id.to_string()).with_field(fields::NAME, name)
}

// ── Batches ──────────────────────────────────────────────────────

pub fn modified(zone: Zone, records: Vec<CloudRecord>) -> ZoneChanges {
    let mut changes = ZoneChanges::empty(zone);
    changes.modified = records;
    changes
}

pub fn deleted(zone: Zone, ids: &[Uuid]) -> ZoneChanges {
    let mut changes = ZoneChanges::empty(zone);
    changes.deleted = ids
        .iter()
        .map(|id| RecordDeletion::new(id.to_string(), zone))
        .collect();
    changes
}

pub fn zone_deleted(zone: Zone) -> ZoneChanges {
    let mut changes = ZoneChanges::empty(zone);
    changes.zone_deleted = true;
    changes
}

// ── Engines ──────────────────────────────────────────────────────

pub fn new_engine() -> (Arc<MemoryChangeSource>, ReconciliationEngine<MemoryStore>) {
    new_engine_with(SyncConfig::default())
}

pub fn new_engine_with(
    config: SyncConfig,
) -> (Arc<MemoryChangeSource>, ReconciliationEngine<MemoryStore>) {
    let source = Arc::new(MemoryChangeSource::new());
    let engine = ReconciliationEngine::new(source.clone(), MemoryStore::new(), config);
    (source, engine)
}
