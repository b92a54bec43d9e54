//! Pending relationship tracking.
//!
//! An Item record may name a Location or Category the store does not hold
//! yet. The desired ids are staged here, keyed by item, and linked onto the
//! item once the targets show up. Entries live in process memory only.

use std::collections::HashMap;
use stowage_storage::{EntityStore, StorageResult};
use stowage_types::{CategoryId, ItemId, LocationId};
use tracing::debug;

/// Relationship targets an item still waits for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingRelationship {
    pub location: Option<LocationId>,
    pub category: Option<CategoryId>,
}

impl PendingRelationship {
    /// True once no slot is waiting for a target.
    pub fn is_satisfied(&self) -> bool {
        self.location.is_none() && self.category.is_none()
    }
}

/// Outcome of a resolve call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Individual references linked onto items.
    pub linked: usize,
    /// Entries evicted because every slot was satisfied.
    pub resolved: usize,
    /// Entries still pending afterwards.
    pub remaining: usize,
}

/// Staged, not-yet-satisfied references from items to locations/categories.
#[derive(Debug, Default)]
pub struct PendingRelationshipTracker {
    entries: HashMap<ItemId, PendingRelationship>,
}

impl PendingRelationshipTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges an observation into the entry for `item`.
    ///
    /// A present id overwrites its slot; an absent one leaves the slot as it
    /// was. Observing nothing for an item without an entry creates none.
    pub fn stage(
        &mut self,
        item: ItemId,
        location: Option<LocationId>,
        category: Option<CategoryId>,
    ) {
        if location.is_none() && category.is_none() {
            return;
        }
        let entry = self.entries.entry(item).or_default();
        if location.is_some() {
            entry.location = location;
        }
        if category.is_some() {
            entry.category = category;
        }
    }

    /// Attempts to satisfy every staged entry against the store.
    pub fn resolve(&mut self, store: &mut dyn EntityStore) -> StorageResult<ResolveReport> {
        let mut ids: Vec<ItemId> = self.entries.keys().copied().collect();
        ids.sort();
        self.resolve_items(&ids, store)
    }

    /// Attempts to satisfy the entries of the given items only.
    pub fn resolve_items(
        &mut self,
        items: &[ItemId],
        store: &mut dyn EntityStore,
    ) -> StorageResult<ResolveReport> {
        let mut report = ResolveReport::default();

        for id in items {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            report.linked += link_entry(*id, entry, store)?;
            if entry.is_satisfied() {
                self.entries.remove(id);
                report.resolved += 1;
            }
        }

        report.remaining = self.entries.len();
        Ok(report)
    }

    /// Drops the entry for a deleted item.
    pub fn evict(&mut self, item: &ItemId) -> Option<PendingRelationship> {
        let evicted = self.entries.remove(item);
        if evicted.is_some() {
            debug!("Evicted pending relationships for item {}", item);
        }
        evicted
    }

    pub fn get(&self, item: &ItemId) -> Option<&PendingRelationship> {
        self.entries.get(item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Links every available target onto the item and clears the slots it
/// satisfied. Returns the number of references linked.
fn link_entry(
    item_id: ItemId,
    entry: &mut PendingRelationship,
    store: &mut dyn EntityStore,
) -> StorageResult<usize> {
    // Not applied locally (yet); keep waiting.
    let Some(mut item) = store.item(&item_id)? else {
        return Ok(0);
    };

    let mut linked = 0;
    if let Some(location) = entry.location {
        if store.contains_location(&location)? {
            item.location = Some(location);
            entry.location = None;
            linked += 1;
        }
    }
    if let Some(category) = entry.category {
        if store.contains_category(&category)? {
            item.category = Some(category);
            entry.category = None;
            linked += 1;
        }
    }

    if linked > 0 {
        store.put_item(item)?;
        debug!("Linked {} reference(s) onto item {}", linked, item_id);
    }
    Ok(linked)
}
