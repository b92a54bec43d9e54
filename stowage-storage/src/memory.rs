//! Memory-backed entity store.

use crate::error::{StorageError, StorageResult};
use crate::store::EntityStore;
use crate::working::WorkingSet;
use stowage_types::{Category, CategoryId, EntityKind, Item, ItemId, Location, LocationId};
use tracing::debug;

/// An [`EntityStore`] that keeps everything in memory.
///
/// Committed state is kept as a separate snapshot so tests can tell what a
/// reader would have observed. `fail_next_commit` injects a single commit
/// failure.
#[derive(Debug, Default)]
pub struct MemoryStore {
    working: WorkingSet,
    committed: WorkingSet,
    commits: usize,
    fail_next_commit: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call to `commit` fail without persisting anything.
    pub fn fail_next_commit(&mut self) {
        self.fail_next_commit = true;
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn committed_item(&self, id: &ItemId) -> Option<&Item> {
        self.committed.items.get(id)
    }

    pub fn committed_location(&self, id: &LocationId) -> Option<&Location> {
        self.committed.locations.get(id)
    }

    pub fn committed_category(&self, id: &CategoryId) -> Option<&Category> {
        self.committed.categories.get(id)
    }

    pub fn len(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Item => self.working.items.len(),
            EntityKind::Location => self.working.locations.len(),
            EntityKind::Category => self.working.categories.len(),
        }
    }
}

impl EntityStore for MemoryStore {
    fn item(&self, id: &ItemId) -> StorageResult<Option<Item>> {
        Ok(self.working.items.get(id).cloned())
    }

    fn location(&self, id: &LocationId) -> StorageResult<Option<Location>> {
        Ok(self.working.locations.get(id).cloned())
    }

    fn category(&self, id: &CategoryId) -> StorageResult<Option<Category>> {
        Ok(self.working.categories.get(id).cloned())
    }

    fn put_item(&mut self, item: Item) -> StorageResult<()> {
        self.working.items.insert(item.id, item);
        Ok(())
    }

    fn put_location(&mut self, location: Location) -> StorageResult<()> {
        self.working.locations.insert(location.id, location);
        Ok(())
    }

    fn put_category(&mut self, category: Category) -> StorageResult<()> {
        self.working.categories.insert(category.id, category);
        Ok(())
    }

    fn delete_item(&mut self, id: &ItemId) -> StorageResult<bool> {
        Ok(self.working.items.remove(id).is_some())
    }

    fn delete_location(&mut self, id: &LocationId) -> StorageResult<bool> {
        Ok(self.working.locations.remove(id).is_some())
    }

    fn delete_category(&mut self, id: &CategoryId) -> StorageResult<bool> {
        Ok(self.working.categories.remove(id).is_some())
    }

    fn delete_all(&mut self, kind: EntityKind) -> StorageResult<usize> {
        Ok(self.working.clear_kind(kind))
    }

    fn item_ids(&self) -> StorageResult<Vec<ItemId>> {
        Ok(self.working.sorted_item_ids())
    }

    fn location_ids(&self) -> StorageResult<Vec<LocationId>> {
        Ok(self.working.sorted_location_ids())
    }

    fn category_ids(&self) -> StorageResult<Vec<CategoryId>> {
        Ok(self.working.sorted_category_ids())
    }

    fn commit(&mut self) -> StorageResult<()> {
        if std::mem::take(&mut self.fail_next_commit) {
            return Err(StorageError::Commit("injected commit failure".to_string()));
        }
        self.committed = self.working.clone();
        self.commits += 1;
        debug!(
            "Committed memory store: {} items, {} locations, {} categories",
            self.committed.items.len(),
            self.committed.locations.len(),
            self.committed.categories.len()
        );
        Ok(())
    }
}
