//! In-memory working set shared by both store implementations.

use std::collections::HashMap;
use stowage_types::{Category, CategoryId, EntityKind, Item, ItemId, Location, LocationId};

#[derive(Debug, Clone, Default)]
pub(crate) struct WorkingSet {
    pub items: HashMap<ItemId, Item>,
    pub locations: HashMap<LocationId, Location>,
    pub categories: HashMap<CategoryId, Category>,
}

impl WorkingSet {
    pub fn clear_kind(&mut self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Item => self.items.drain().count(),
            EntityKind::Location => self.locations.drain().count(),
            EntityKind::Category => self.categories.drain().count(),
        }
    }

    pub fn sorted_item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<_> = self.items.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn sorted_location_ids(&self) -> Vec<LocationId> {
        let mut ids: Vec<_> = self.locations.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn sorted_category_ids(&self) -> Vec<CategoryId> {
        let mut ids: Vec<_> = self.categories.keys().copied().collect();
        ids.sort();
        ids
    }
}
