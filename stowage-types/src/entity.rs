use crate::ids::{CategoryId, ItemId, LocationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three entity kinds held by the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Item,
    Location,
    Category,
}

impl EntityKind {
    /// All kinds, in dependency order (referenced kinds first).
    pub const ALL: [EntityKind; 3] = [EntityKind::Location, EntityKind::Category, EntityKind::Item];

    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Location => "location",
            EntityKind::Category => "category",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "item" => Ok(EntityKind::Item),
            "location" => Ok(EntityKind::Location),
            "category" => Ok(EntityKind::Category),
            other => Err(crate::Error::UnknownKind(other.to_string())),
        }
    }
}

/// A color in the encoded byte form the remote schema stores it in.
///
/// The bytes are opaque to the sync core; the UI layer decodes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(Vec<u8>);

impl Color {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An inventory item.
///
/// `location` and `category` hold the ids of the referenced entities. A
/// reference whose target is absent from the store is dangling and simply
/// resolves to nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub sort_order: i64,
    /// Remote modification time, used only as a last-write marker.
    pub modified_date: DateTime<Utc>,
    pub creation_date: DateTime<Utc>,
    pub symbol: Option<String>,
    pub symbol_color: Option<Color>,
    pub image: Option<Vec<u8>>,
    pub location: Option<LocationId>,
    pub category: Option<CategoryId>,
}

impl Item {
    /// Creates an item with the given required fields and empty optionals.
    pub fn new(id: ItemId, name: impl Into<String>, quantity: u32, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            quantity,
            sort_order: 0,
            modified_date: now,
            creation_date: now,
            symbol: None,
            symbol_color: None,
            image: None,
            location: None,
            category: None,
        }
    }
}

/// A place items are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub sort_order: i64,
    pub display_in_row: bool,
    pub color: Color,
}

impl Location {
    pub fn new(id: LocationId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sort_order: 0,
            display_in_row: false,
            color: Color::default(),
        }
    }
}

/// A grouping of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub sort_order: i64,
    pub display_in_row: bool,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sort_order: 0,
            display_in_row: false,
        }
    }
}
