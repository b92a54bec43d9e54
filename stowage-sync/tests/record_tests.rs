use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use stowage_sync::{fields, CloudRecord, FieldValue, Zone, ZoneChanges};
use stowage_types::EntityKind;

// ── Zones ────────────────────────────────────────────────────────

#[test]
fn zone_kind_mapping() {
    for zone in Zone::ALL {
        assert_eq!(Zone::for_kind(zone.kind()), zone);
    }
    assert_eq!(Zone::Locations.kind(), EntityKind::Location);
}

#[test]
fn zone_parses_case_insensitively() {
    assert_eq!("categories".parse::<Zone>().unwrap(), Zone::Categories);
    assert_eq!(Zone::Items.to_string(), "Items");
    assert!("Garage".parse::<Zone>().is_err());
}

// ── Field access ─────────────────────────────────────────────────

#[test]
fn typed_accessors_reject_wrong_types() {
    let record = CloudRecord::new(EntityKind::Item, "r")
        .with_field(fields::NAME, "Drill")
        .with_field(fields::QUANTITY, 3);

    assert_eq!(record.string(fields::NAME), Some("Drill"));
    assert_eq!(record.int(fields::QUANTITY), Some(3));
    assert_eq!(record.int(fields::NAME), None);
    assert_eq!(record.string(fields::QUANTITY), None);
    assert_eq!(record.bytes(fields::IMAGE), None);
}

#[test]
fn bool_accepts_integer_encoding() {
    let record = CloudRecord::new(EntityKind::Location, "r")
        .with_field("a", 0)
        .with_field("b", 2)
        .with_field("c", true)
        .with_field("d", 1.0);
    assert_eq!(record.bool("a"), Some(false));
    assert_eq!(record.bool("b"), Some(true));
    assert_eq!(record.bool("c"), Some(true));
    assert_eq!(record.bool("d"), None);
}

#[test]
fn reference_accepts_plain_strings() {
    let record = CloudRecord::new(EntityKind::Item, "r")
        .with_field(fields::LOCATION_ID, FieldValue::reference("abc"))
        .with_field(fields::CATEGORY_ID, "def");
    assert_eq!(record.reference(fields::LOCATION_ID), Some("abc"));
    assert_eq!(record.reference(fields::CATEGORY_ID), Some("def"));
}

#[test]
fn record_survives_json() {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let record = CloudRecord::new(EntityKind::Item, "r")
        .with_modified_at(at)
        .with_field(fields::MODIFIED_DATE, at)
        .with_field(fields::IMAGE, vec![1u8, 2]);

    let json = serde_json::to_string(&record).unwrap();
    let back: CloudRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
}

#[test]
fn empty_changes() {
    let mut changes = ZoneChanges::empty(Zone::Items);
    assert!(changes.is_empty());
    changes.zone_deleted = true;
    assert!(!changes.is_empty());
}
