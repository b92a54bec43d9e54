use crate::error::StorageResult;
use stowage_types::{Category, CategoryId, EntityKind, Item, ItemId, Location, LocationId};

/// Id-indexed access to the three entity kinds, plus a transactional commit.
///
/// Mutations are visible to subsequent reads through the same store
/// immediately; `commit` makes them durable.
pub trait EntityStore: Send {
    fn item(&self, id: &ItemId) -> StorageResult<Option<Item>>;
    fn location(&self, id: &LocationId) -> StorageResult<Option<Location>>;
    fn category(&self, id: &CategoryId) -> StorageResult<Option<Category>>;

    /// Inserts or replaces an item.
    fn put_item(&mut self, item: Item) -> StorageResult<()>;
    fn put_location(&mut self, location: Location) -> StorageResult<()>;
    fn put_category(&mut self, category: Category) -> StorageResult<()>;

    /// Deletes an item. Returns false if it did not exist.
    fn delete_item(&mut self, id: &ItemId) -> StorageResult<bool>;
    fn delete_location(&mut self, id: &LocationId) -> StorageResult<bool>;
    fn delete_category(&mut self, id: &CategoryId) -> StorageResult<bool>;

    /// Deletes every entity of a kind. Returns how many were removed.
    fn delete_all(&mut self, kind: EntityKind) -> StorageResult<usize>;

    fn item_ids(&self) -> StorageResult<Vec<ItemId>>;
    fn location_ids(&self) -> StorageResult<Vec<LocationId>>;
    fn category_ids(&self) -> StorageResult<Vec<CategoryId>>;

    /// Persists all changes made since the last successful commit.
    fn commit(&mut self) -> StorageResult<()>;

    fn contains_location(&self, id: &LocationId) -> StorageResult<bool> {
        Ok(self.location(id)?.is_some())
    }

    fn contains_category(&self, id: &CategoryId) -> StorageResult<bool> {
        Ok(self.category(id)?.is_some())
    }
}
