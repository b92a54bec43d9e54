//! Remote change records.
//!
//! A record is a kind tag plus a bag of typed fields, as delivered by the
//! cloud database. Records live in zones; each zone holds exactly one kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use stowage_types::EntityKind;

/// Field names used by the remote schema.
pub mod fields {
    pub const NAME: &str = "name";
    pub const QUANTITY: &str = "quantity";
    pub const SORT_ORDER: &str = "sortOrder";
    pub const DISPLAY_IN_ROW: &str = "displayInRow";
    pub const COLOR: &str = "color";
    pub const SYMBOL: &str = "symbol";
    pub const SYMBOL_COLOR: &str = "symbolColor";
    pub const IMAGE: &str = "image";
    pub const MODIFIED_DATE: &str = "modifiedDate";
    pub const CREATION_DATE: &str = "creationDate";
    pub const ITEM_ID: &str = "itemID";
    /// Identity on Location records, reference on Item records.
    pub const LOCATION_ID: &str = "locationID";
    /// Identity on Category records, reference on Item records.
    pub const CATEGORY_ID: &str = "categoryID";
}

/// A named partition of the remote record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Zone {
    Items,
    Locations,
    Categories,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Items, Zone::Locations, Zone::Categories];

    /// The zone name as known to the remote database.
    pub fn name(&self) -> &'static str {
        match self {
            Zone::Items => "Items",
            Zone::Locations => "Locations",
            Zone::Categories => "Categories",
        }
    }

    /// The kind of record this zone holds.
    pub fn kind(&self) -> EntityKind {
        match self {
            Zone::Items => EntityKind::Item,
            Zone::Locations => EntityKind::Location,
            Zone::Categories => EntityKind::Category,
        }
    }

    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Item => Zone::Items,
            EntityKind::Location => Zone::Locations,
            EntityKind::Category => Zone::Categories,
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Zone {
    type Err = crate::SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Zone::ALL
            .into_iter()
            .find(|z| z.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| crate::SyncError::Config(format!("unknown zone: {s}")))
    }
}

/// A typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    /// The record name of another record.
    Reference(String),
}

impl FieldValue {
    pub fn reference(target: impl ToString) -> Self {
        FieldValue::Reference(target.to_string())
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(i64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(v)
    }
}

/// One remote change unit: the desired state of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudRecord {
    /// Storage-assigned identifier of the record.
    pub record_name: String,
    /// Record type.
    pub kind: EntityKind,
    /// Server-side modification time, when known.
    pub modified_at: Option<DateTime<Utc>>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl CloudRecord {
    pub fn new(kind: EntityKind, record_name: impl Into<String>) -> Self {
        Self {
            record_name: record_name.into(),
            kind,
            modified_at: None,
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn with_modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.modified_at = Some(at);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<FieldValue>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        match self.fields.get(key)? {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Booleans are also accepted in their integer encoding (0 / non-zero).
    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.fields.get(key)? {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.fields.get(key)? {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn timestamp(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(key)? {
            FieldValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// A reference, or a plain string holding the target's identifier.
    pub fn reference(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            FieldValue::Reference(s) | FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A record reported deleted, with the zone it lived in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDeletion {
    pub record_name: String,
    pub zone: Zone,
}

impl RecordDeletion {
    pub fn new(record_name: impl Into<String>, zone: Zone) -> Self {
        Self {
            record_name: record_name.into(),
            zone,
        }
    }
}

/// The result of one fetch against one zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneChanges {
    pub zone: Zone,
    /// Created or updated records, in delivery order.
    pub modified: Vec<CloudRecord>,
    pub deleted: Vec<RecordDeletion>,
    /// The whole zone no longer exists remotely.
    pub zone_deleted: bool,
    /// Cursor to resume from on the next fetch.
    pub next_cursor: Option<String>,
    /// The source has more changes for this zone right now.
    pub more_coming: bool,
}

impl ZoneChanges {
    pub fn empty(zone: Zone) -> Self {
        Self {
            zone,
            modified: Vec::new(),
            deleted: Vec::new(),
            zone_deleted: false,
            next_cursor: None,
            more_coming: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.deleted.is_empty() && !self.zone_deleted
    }
}
