//! Record mapper - applies remote records to the entity store.
//!
//! Each record produces or updates exactly one entity of its kind. Fields
//! present on the record overwrite the local value; absent fields leave it
//! untouched. A record missing its identity or a required field is skipped,
//! never turned into an error, so one malformed record cannot abort a pass.

use crate::record::{fields, CloudRecord};
use chrono::Utc;
use std::fmt;
use stowage_storage::{EntityStore, StorageResult};
use stowage_types::{
    Category, CategoryId, Color, EntityKind, Item, ItemId, Location, LocationId,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Why a record was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Neither the identity field nor the record name is a UUID.
    MissingIdentity,
    /// A required field is absent.
    MissingField(&'static str),
    /// A required field has the wrong type or an out-of-range value.
    InvalidField(&'static str),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingIdentity => write!(f, "no usable identity"),
            SkipReason::MissingField(name) => write!(f, "missing required field {name}"),
            SkipReason::InvalidField(name) => write!(f, "invalid required field {name}"),
        }
    }
}

/// Relationship targets an Item record asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DesiredRelationships {
    pub location: Option<LocationId>,
    pub category: Option<CategoryId>,
}

impl DesiredRelationships {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.category.is_none()
    }
}

/// What applying a record did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOutcome {
    Item {
        id: ItemId,
        created: bool,
        desired: DesiredRelationships,
    },
    Location {
        id: LocationId,
        created: bool,
    },
    Category {
        id: CategoryId,
        created: bool,
    },
    Skipped(SkipReason),
}

impl MapOutcome {
    /// The identity of the touched entity, if one was touched.
    pub fn identity(&self) -> Option<Uuid> {
        match self {
            MapOutcome::Item { id, .. } => Some(id.as_uuid()),
            MapOutcome::Location { id, .. } => Some(id.as_uuid()),
            MapOutcome::Category { id, .. } => Some(id.as_uuid()),
            MapOutcome::Skipped(_) => None,
        }
    }
}

/// Translates remote records into local entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMapper;

impl RecordMapper {
    pub fn new() -> Self {
        Self
    }

    /// Applies a single record to the store.
    pub fn apply(
        &self,
        record: &CloudRecord,
        store: &mut dyn EntityStore,
    ) -> StorageResult<MapOutcome> {
        let outcome = match record.kind {
            EntityKind::Item => self.apply_item(record, store)?,
            EntityKind::Location => self.apply_location(record, store)?,
            EntityKind::Category => self.apply_category(record, store)?,
        };

        if let MapOutcome::Skipped(reason) = &outcome {
            warn!(
                "Skipping {} record {}: {}",
                record.kind, record.record_name, reason
            );
        }
        Ok(outcome)
    }

    fn apply_item(
        &self,
        record: &CloudRecord,
        store: &mut dyn EntityStore,
    ) -> StorageResult<MapOutcome> {
        let Some(id) = resolve_identity(record, fields::ITEM_ID).map(ItemId::from_uuid) else {
            return Ok(MapOutcome::Skipped(SkipReason::MissingIdentity));
        };
        let Some(name) = record.string(fields::NAME) else {
            return Ok(MapOutcome::Skipped(SkipReason::MissingField(fields::NAME)));
        };
        let quantity = match record.get(fields::QUANTITY) {
            None => return Ok(MapOutcome::Skipped(SkipReason::MissingField(fields::QUANTITY))),
            Some(_) => match record.int(fields::QUANTITY).map(u32::try_from) {
                Some(Ok(q)) => q,
                _ => return Ok(MapOutcome::Skipped(SkipReason::InvalidField(fields::QUANTITY))),
            },
        };

        let modified = record
            .timestamp(fields::MODIFIED_DATE)
            .or(record.modified_at);

        let existing = store.item(&id)?;
        let created = existing.is_none();
        let mut item = match existing {
            Some(mut item) => {
                item.name = name.to_string();
                item.quantity = quantity;
                item
            }
            None => Item::new(id, name, quantity, modified.unwrap_or_else(Utc::now)),
        };

        if let Some(modified) = modified {
            item.modified_date = modified;
        }
        if let Some(created_at) = record.timestamp(fields::CREATION_DATE) {
            item.creation_date = created_at;
        }
        if let Some(order) = record.int(fields::SORT_ORDER) {
            item.sort_order = order;
        }
        if let Some(symbol) = record.string(fields::SYMBOL) {
            item.symbol = Some(symbol.to_string());
        }
        if let Some(color) = record.bytes(fields::SYMBOL_COLOR) {
            item.symbol_color = Some(Color::from_bytes(color));
        }
        if let Some(image) = record.bytes(fields::IMAGE) {
            item.image = Some(image.to_vec());
        }

        store.put_item(item)?;

        // Extracted whether or not the targets exist yet; linking happens
        // when the pending tracker resolves.
        let desired = DesiredRelationships {
            location: parse_reference(record, fields::LOCATION_ID).map(LocationId::from_uuid),
            category: parse_reference(record, fields::CATEGORY_ID).map(CategoryId::from_uuid),
        };

        debug!("{} item {}", if created { "Created" } else { "Updated" }, id);
        Ok(MapOutcome::Item {
            id,
            created,
            desired,
        })
    }

    fn apply_location(
        &self,
        record: &CloudRecord,
        store: &mut dyn EntityStore,
    ) -> StorageResult<MapOutcome> {
        let Some(id) = resolve_identity(record, fields::LOCATION_ID).map(LocationId::from_uuid)
        else {
            return Ok(MapOutcome::Skipped(SkipReason::MissingIdentity));
        };
        let Some(name) = record.string(fields::NAME) else {
            return Ok(MapOutcome::Skipped(SkipReason::MissingField(fields::NAME)));
        };

        let existing = store.location(&id)?;
        let created = existing.is_none();
        let mut location = existing.unwrap_or_else(|| Location::new(id, name));
        location.name = name.to_string();

        if let Some(order) = record.int(fields::SORT_ORDER) {
            location.sort_order = order;
        }
        if let Some(in_row) = record.bool(fields::DISPLAY_IN_ROW) {
            location.display_in_row = in_row;
        }
        if let Some(color) = record.bytes(fields::COLOR) {
            location.color = Color::from_bytes(color);
        }

        store.put_location(location)?;
        debug!("{} location {}", if created { "Created" } else { "Updated" }, id);
        Ok(MapOutcome::Location { id, created })
    }

    fn apply_category(
        &self,
        record: &CloudRecord,
        store: &mut dyn EntityStore,
    ) -> StorageResult<MapOutcome> {
        let Some(id) = resolve_identity(record, fields::CATEGORY_ID).map(CategoryId::from_uuid)
        else {
            return Ok(MapOutcome::Skipped(SkipReason::MissingIdentity));
        };
        let Some(name) = record.string(fields::NAME) else {
            return Ok(MapOutcome::Skipped(SkipReason::MissingField(fields::NAME)));
        };

        let existing = store.category(&id)?;
        let created = existing.is_none();
        let mut category = existing.unwrap_or_else(|| Category::new(id, name));
        category.name = name.to_string();

        if let Some(order) = record.int(fields::SORT_ORDER) {
            category.sort_order = order;
        }
        if let Some(in_row) = record.bool(fields::DISPLAY_IN_ROW) {
            category.display_in_row = in_row;
        }

        store.put_category(category)?;
        debug!("{} category {}", if created { "Created" } else { "Updated" }, id);
        Ok(MapOutcome::Category { id, created })
    }
}

/// Resolves a record's identity: the kind-specific identity field first,
/// then the record name. `None` if neither is a UUID.
pub fn resolve_identity(record: &CloudRecord, identity_field: &str) -> Option<Uuid> {
    record
        .reference(identity_field)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .or_else(|| Uuid::parse_str(&record.record_name).ok())
}

fn parse_reference(record: &CloudRecord, field: &str) -> Option<Uuid> {
    let raw = record.reference(field)?;
    match Uuid::parse_str(raw) {
        Ok(uuid) => Some(uuid),
        Err(e) => {
            warn!(
                "Ignoring unparseable {} reference on record {}: {}",
                field, record.record_name, e
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_prefers_field_over_record_name() {
        let field_id = Uuid::new_v4();
        let record = CloudRecord::new(EntityKind::Item, Uuid::new_v4().to_string())
            .with_field(fields::ITEM_ID, field_id.to_string());
        assert_eq!(resolve_identity(&record, fields::ITEM_ID), Some(field_id));
    }

    #[test]
    fn identity_falls_back_to_record_name() {
        let name = Uuid::new_v4();
        let record = CloudRecord::new(EntityKind::Location, name.to_string())
            .with_field(fields::LOCATION_ID, "not-a-uuid");
        assert_eq!(resolve_identity(&record, fields::LOCATION_ID), Some(name));
    }

    #[test]
    fn identity_missing_everywhere() {
        let record = CloudRecord::new(EntityKind::Category, "_defaultRecord");
        assert_eq!(resolve_identity(&record, fields::CATEGORY_ID), None);
    }

    #[test]
    fn skip_reason_names_the_field() {
        let reason = SkipReason::MissingField(fields::QUANTITY);
        assert!(reason.to_string().contains("quantity"));
    }
}
