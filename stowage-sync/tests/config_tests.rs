use pretty_assertions::assert_eq;
use std::time::Duration;
use stowage_sync::{SyncConfig, SyncError, Zone};

#[test]
fn defaults() {
    let config = SyncConfig::default();
    assert_eq!(config.zones, vec![Zone::Items, Zone::Locations, Zone::Categories]);
    assert_eq!(config.auto_sync_interval(), Duration::from_secs(60));
    assert_eq!(config.status_reset_after(), Some(Duration::from_secs(3)));
    assert!(config.validate().is_ok());
}

#[test]
fn empty_json_gives_defaults() {
    assert_eq!(SyncConfig::from_json("{}").unwrap(), SyncConfig::default());
}

#[test]
fn partial_json_overrides_named_keys() {
    let config = SyncConfig::from_json(
        r#"{"zones": ["Categories"], "auto_sync_interval_secs": 300, "status_reset_after_ms": 0}"#,
    )
    .unwrap();
    assert_eq!(config.zones, vec![Zone::Categories]);
    assert_eq!(config.auto_sync_interval(), Duration::from_secs(300));
    assert_eq!(config.status_reset_after(), None);
    assert_eq!(config.container_id, SyncConfig::default().container_id);
}

#[test]
fn rejects_invalid_settings() {
    for json in [
        r#"{"zones": []}"#,
        r#"{"zones": ["Items", "Items"]}"#,
        r#"{"auto_sync_interval_secs": 0}"#,
    ] {
        let err = SyncConfig::from_json(json).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)), "{json}: {err}");
    }
}

#[test]
fn rejects_malformed_json() {
    let err = SyncConfig::from_json(r#"{"zones": ["Garage"]}"#).unwrap_err();
    assert!(matches!(err, SyncError::Serialization(_)));
}
