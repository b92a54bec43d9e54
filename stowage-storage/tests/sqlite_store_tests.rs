use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use std::time::Duration;
use stowage_storage::{EntityStore, SqliteStore, StorageError};
use stowage_types::{Category, CategoryId, Color, EntityKind, Item, ItemId, Location, LocationId};
use tempfile::TempDir;

fn full_item(location: LocationId, category: CategoryId) -> Item {
    let created = Utc.with_ymd_and_hms(2023, 11, 5, 8, 30, 0).unwrap();
    let mut item = Item::new(ItemId::new(), "Drill", 3, created);
    item.sort_order = 7;
    item.modified_date = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
    item.symbol = Some("hammer".to_string());
    item.symbol_color = Some(Color::from_bytes(vec![0xff, 0, 0]));
    item.image = Some(vec![1, 2, 3, 4]);
    item.location = Some(location);
    item.category = Some(category);
    item
}

// ── Persistence ──────────────────────────────────────────────────

#[test]
fn committed_entities_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stowage.db");

    let mut loc = Location::new(LocationId::new(), "Garage");
    loc.display_in_row = true;
    loc.color = Color::from_bytes(vec![9, 9]);
    let cat = Category::new(CategoryId::new(), "Tools");
    let item = full_item(loc.id, cat.id);

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.put_location(loc.clone()).unwrap();
        store.put_category(cat.clone()).unwrap();
        store.put_item(item.clone()).unwrap();
        store.commit().unwrap();
        assert!(!store.has_staged_changes());
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.location(&loc.id).unwrap(), Some(loc));
    assert_eq!(store.category(&cat.id).unwrap(), Some(cat));
    assert_eq!(store.item(&item.id).unwrap(), Some(item));
}

#[test]
fn uncommitted_changes_are_not_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stowage.db");
    let loc = Location::new(LocationId::new(), "Attic");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.put_location(loc.clone()).unwrap();
        assert!(store.has_staged_changes());
        assert!(store.contains_location(&loc.id).unwrap());
    }

    let store = SqliteStore::open(&path).unwrap();
    assert!(store.location(&loc.id).unwrap().is_none());
}

#[test]
fn deletes_and_purges_are_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stowage.db");
    let keep = Location::new(LocationId::new(), "Kitchen");
    let gone = Location::new(LocationId::new(), "Basement");
    let cat = Category::new(CategoryId::new(), "Paint");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.put_location(keep.clone()).unwrap();
        store.put_location(gone.clone()).unwrap();
        store.put_category(cat.clone()).unwrap();
        store.commit().unwrap();

        assert!(store.delete_location(&gone.id).unwrap());
        assert_eq!(store.delete_all(EntityKind::Category).unwrap(), 1);
        store.commit().unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    assert_eq!(store.location_ids().unwrap(), vec![keep.id]);
    assert!(store.category_ids().unwrap().is_empty());
}

#[test]
fn put_after_purge_survives_commit() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.put_category(Category::new(CategoryId::new(), "Old")).unwrap();
    store.commit().unwrap();

    store.delete_all(EntityKind::Category).unwrap();
    let fresh = Category::new(CategoryId::new(), "New");
    store.put_category(fresh.clone()).unwrap();
    store.commit().unwrap();

    assert_eq!(store.category_ids().unwrap(), vec![fresh.id]);
}

#[test]
fn deleting_missing_entity_is_not_staged() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    assert!(!store.delete_item(&ItemId::new()).unwrap());
    assert!(!store.has_staged_changes());
}

#[test]
fn dangling_references_are_stored_as_is() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let item = full_item(LocationId::new(), CategoryId::new());
    store.put_item(item.clone()).unwrap();
    store.commit().unwrap();

    let loaded = store.item(&item.id).unwrap().unwrap();
    assert!(store.location(&loaded.location.unwrap()).unwrap().is_none());
}

// ── Commit failures ──────────────────────────────────────────────

#[test]
fn failed_commit_keeps_staged_writes_for_retry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stowage.db");

    let loc = Location::new(LocationId::new(), "Garage");
    let cat = Category::new(CategoryId::new(), "Tools");
    let item = full_item(loc.id, cat.id);

    let mut store = SqliteStore::open(&path).unwrap();
    store.set_busy_timeout(Duration::from_millis(10)).unwrap();
    store.put_location(loc.clone()).unwrap();
    store.put_category(cat.clone()).unwrap();
    store.put_item(item.clone()).unwrap();

    let locker = Connection::open(&path).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let err = store.commit().unwrap_err();
    assert!(matches!(err, StorageError::Commit(_)), "{err}");
    assert!(store.has_staged_changes());

    locker.execute_batch("COMMIT;").unwrap();
    drop(locker);

    store.commit().unwrap();
    assert!(!store.has_staged_changes());
    drop(store);

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.item(&item.id).unwrap(), Some(item));
    assert_eq!(reopened.location(&loc.id).unwrap(), Some(loc));
    assert_eq!(reopened.category(&cat.id).unwrap(), Some(cat));
}
