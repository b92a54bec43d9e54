use chrono::{TimeZone, Utc};
use stowage_types::{Category, Color, EntityKind, Item, ItemId, Location, LocationId};

// ── EntityKind ───────────────────────────────────────────────────

#[test]
fn kind_parses_case_insensitively() {
    assert_eq!("Item".parse::<EntityKind>().unwrap(), EntityKind::Item);
    assert_eq!("LOCATION".parse::<EntityKind>().unwrap(), EntityKind::Location);
    assert_eq!("category".parse::<EntityKind>().unwrap(), EntityKind::Category);
}

#[test]
fn kind_rejects_unknown() {
    let err = "shelf".parse::<EntityKind>().unwrap_err();
    assert!(err.to_string().contains("shelf"));
}

#[test]
fn kind_all_lists_referenced_kinds_first() {
    assert_eq!(EntityKind::ALL.last(), Some(&EntityKind::Item));
}

// ── Entities ─────────────────────────────────────────────────────

#[test]
fn new_item_has_empty_optionals() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let item = Item::new(ItemId::new(), "Drill", 3, now);
    assert_eq!(item.quantity, 3);
    assert_eq!(item.creation_date, now);
    assert_eq!(item.modified_date, now);
    assert!(item.location.is_none());
    assert!(item.category.is_none());
    assert!(item.symbol.is_none());
}

#[test]
fn new_location_defaults() {
    let loc = Location::new(LocationId::new(), "Garage");
    assert_eq!(loc.sort_order, 0);
    assert!(!loc.display_in_row);
    assert!(loc.color.is_empty());
}

#[test]
fn color_keeps_bytes() {
    let color = Color::from_bytes(vec![1, 2, 3]);
    assert_eq!(color.as_bytes(), &[1, 2, 3]);
    assert!(!color.is_empty());
}

#[test]
fn category_serde_roundtrip() {
    let cat = Category::new(stowage_types::CategoryId::new(), "Tools");
    let json = serde_json::to_string(&cat).unwrap();
    let back: Category = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cat);
}
