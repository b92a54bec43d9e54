//! SQLite-backed entity store.
//!
//! The full entity set is loaded into memory on open. Writes go to the
//! in-memory working set and are recorded as staged operations; `commit`
//! flushes them inside a single SQLite transaction. If the flush fails the
//! staged operations are kept and the next commit retries them.

use crate::error::{StorageError, StorageResult};
use crate::store::EntityStore;
use crate::working::WorkingSet;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::path::Path;
use std::time::Duration;
use stowage_types::{Category, CategoryId, Color, EntityKind, Item, ItemId, Location, LocationId};
use tracing::{debug, info};

/// Pending writes for one entity kind.
#[derive(Debug)]
struct Staged<K> {
    upserts: HashSet<K>,
    deletes: HashSet<K>,
    purged: bool,
}

impl<K> Default for Staged<K> {
    fn default() -> Self {
        Self {
            upserts: HashSet::new(),
            deletes: HashSet::new(),
            purged: false,
        }
    }
}

impl<K: Eq + Hash + Copy> Staged<K> {
    fn put(&mut self, id: K) {
        self.deletes.remove(&id);
        self.upserts.insert(id);
    }

    fn delete(&mut self, id: K) {
        self.upserts.remove(&id);
        self.deletes.insert(id);
    }

    // A purge supersedes everything staged before it.
    fn purge(&mut self) {
        self.upserts.clear();
        self.deletes.clear();
        self.purged = true;
    }

    fn is_empty(&self) -> bool {
        !self.purged && self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Persistent [`EntityStore`] backed by SQLite.
pub struct SqliteStore {
    conn: Connection,
    working: WorkingSet,
    staged_items: Staged<ItemId>,
    staged_locations: Staged<LocationId>,
    staged_categories: Staged<CategoryId>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path and loads its contents.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        let store = Self::with_connection(conn)?;
        info!("Opened entity store at {:?}", path.as_ref());
        Ok(store)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        init_schema(&conn)?;
        let working = load_working_set(&conn)?;
        Ok(Self {
            conn,
            working,
            staged_items: Staged::default(),
            staged_locations: Staged::default(),
            staged_categories: Staged::default(),
        })
    }

    /// How long a commit waits for another connection's lock before failing.
    pub fn set_busy_timeout(&self, timeout: Duration) -> StorageResult<()> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Returns true if there are writes not yet committed.
    pub fn has_staged_changes(&self) -> bool {
        !(self.staged_items.is_empty()
            && self.staged_locations.is_empty()
            && self.staged_categories.is_empty())
    }

    fn clear_staged(&mut self) {
        self.staged_items = Staged::default();
        self.staged_locations = Staged::default();
        self.staged_categories = Staged::default();
    }
}

fn init_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS locations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            display_in_row INTEGER NOT NULL,
            color BLOB NOT NULL
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            display_in_row INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            sort_order INTEGER NOT NULL,
            modified_date INTEGER NOT NULL,
            creation_date INTEGER NOT NULL,
            symbol TEXT,
            symbol_color BLOB,
            image BLOB,
            location_id TEXT,
            category_id TEXT
        );
        ",
    )?;
    Ok(())
}

// ── Loading ──────────────────────────────────────────────────────

type ItemRow = (
    String,
    String,
    i64,
    i64,
    i64,
    i64,
    Option<String>,
    Option<Vec<u8>>,
    Option<Vec<u8>>,
    Option<String>,
    Option<String>,
);

fn load_working_set(conn: &Connection) -> StorageResult<WorkingSet> {
    let mut working = WorkingSet::default();

    let mut stmt =
        conn.prepare("SELECT id, name, sort_order, display_in_row, color FROM locations")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, bool>(3)?,
            row.get::<_, Vec<u8>>(4)?,
        ))
    })?;
    for row in rows {
        let (id, name, sort_order, display_in_row, color) = row?;
        let id = parse_id(&id, LocationId::parse)?;
        working.locations.insert(
            id,
            Location {
                id,
                name,
                sort_order,
                display_in_row,
                color: Color::from_bytes(color),
            },
        );
    }

    let mut stmt = conn.prepare("SELECT id, name, sort_order, display_in_row FROM categories")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, bool>(3)?,
        ))
    })?;
    for row in rows {
        let (id, name, sort_order, display_in_row) = row?;
        let id = parse_id(&id, CategoryId::parse)?;
        working.categories.insert(
            id,
            Category {
                id,
                name,
                sort_order,
                display_in_row,
            },
        );
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, quantity, sort_order, modified_date, creation_date, symbol,
                symbol_color, image, location_id, category_id
         FROM items",
    )?;
    let rows = stmt.query_map([], |row| -> rusqlite::Result<ItemRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
            row.get(8)?,
            row.get(9)?,
            row.get(10)?,
        ))
    })?;
    for row in rows {
        let item = decode_item(row?)?;
        working.items.insert(item.id, item);
    }

    debug!(
        "Loaded {} items, {} locations, {} categories",
        working.items.len(),
        working.locations.len(),
        working.categories.len()
    );
    Ok(working)
}

fn decode_item(row: ItemRow) -> StorageResult<Item> {
    let (
        id,
        name,
        quantity,
        sort_order,
        modified_ms,
        created_ms,
        symbol,
        symbol_color,
        image,
        location_id,
        category_id,
    ) = row;

    let quantity = u32::try_from(quantity)
        .map_err(|_| StorageError::InvalidData(format!("item {id} has quantity {quantity}")))?;

    Ok(Item {
        id: parse_id(&id, ItemId::parse)?,
        name,
        quantity,
        sort_order,
        modified_date: from_millis(modified_ms)?,
        creation_date: from_millis(created_ms)?,
        symbol,
        symbol_color: symbol_color.map(Color::from_bytes),
        image,
        location: location_id
            .as_deref()
            .map(|s| parse_id(s, LocationId::parse))
            .transpose()?,
        category: category_id
            .as_deref()
            .map(|s| parse_id(s, CategoryId::parse))
            .transpose()?,
    })
}

fn parse_id<T>(raw: &str, parse: fn(&str) -> stowage_types::Result<T>) -> StorageResult<T> {
    parse(raw).map_err(|e| StorageError::InvalidData(format!("bad id {raw:?}: {e}")))
}

fn from_millis(ms: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StorageError::InvalidData(format!("timestamp out of range: {ms}")))
}

// ── Flushing ─────────────────────────────────────────────────────

fn flush_locations(
    tx: &Transaction<'_>,
    staged: &Staged<LocationId>,
    working: &HashMap<LocationId, Location>,
) -> rusqlite::Result<()> {
    if staged.purged {
        tx.execute("DELETE FROM locations", [])?;
    }
    for id in &staged.deletes {
        tx.execute("DELETE FROM locations WHERE id = ?1", params![id.to_string()])?;
    }
    for loc in staged.upserts.iter().filter_map(|id| working.get(id)) {
        tx.execute(
            "INSERT OR REPLACE INTO locations (id, name, sort_order, display_in_row, color)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                loc.id.to_string(),
                loc.name,
                loc.sort_order,
                loc.display_in_row,
                loc.color.as_bytes(),
            ],
        )?;
    }
    Ok(())
}

fn flush_categories(
    tx: &Transaction<'_>,
    staged: &Staged<CategoryId>,
    working: &HashMap<CategoryId, Category>,
) -> rusqlite::Result<()> {
    if staged.purged {
        tx.execute("DELETE FROM categories", [])?;
    }
    for id in &staged.deletes {
        tx.execute("DELETE FROM categories WHERE id = ?1", params![id.to_string()])?;
    }
    for cat in staged.upserts.iter().filter_map(|id| working.get(id)) {
        tx.execute(
            "INSERT OR REPLACE INTO categories (id, name, sort_order, display_in_row)
             VALUES (?1, ?2, ?3, ?4)",
            params![cat.id.to_string(), cat.name, cat.sort_order, cat.display_in_row],
        )?;
    }
    Ok(())
}

fn flush_items(
    tx: &Transaction<'_>,
    staged: &Staged<ItemId>,
    working: &HashMap<ItemId, Item>,
) -> rusqlite::Result<()> {
    if staged.purged {
        tx.execute("DELETE FROM items", [])?;
    }
    for id in &staged.deletes {
        tx.execute("DELETE FROM items WHERE id = ?1", params![id.to_string()])?;
    }
    for item in staged.upserts.iter().filter_map(|id| working.get(id)) {
        tx.execute(
            "INSERT OR REPLACE INTO items (id, name, quantity, sort_order, modified_date,
                creation_date, symbol, symbol_color, image, location_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                item.id.to_string(),
                item.name,
                i64::from(item.quantity),
                item.sort_order,
                item.modified_date.timestamp_millis(),
                item.creation_date.timestamp_millis(),
                item.symbol,
                item.symbol_color.as_ref().map(|c| c.as_bytes()),
                item.image.as_deref(),
                item.location.map(|id| id.to_string()),
                item.category.map(|id| id.to_string()),
            ],
        )?;
    }
    Ok(())
}

impl EntityStore for SqliteStore {
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
        self.staged_items.put(item.id);
        self.working.items.insert(item.id, item);
        Ok(())
    }

    fn put_location(&mut self, location: Location) -> StorageResult<()> {
        self.staged_locations.put(location.id);
        self.working.locations.insert(location.id, location);
        Ok(())
    }

    fn put_category(&mut self, category: Category) -> StorageResult<()> {
        self.staged_categories.put(category.id);
        self.working.categories.insert(category.id, category);
        Ok(())
    }

    fn delete_item(&mut self, id: &ItemId) -> StorageResult<bool> {
        let existed = self.working.items.remove(id).is_some();
        if existed {
            self.staged_items.delete(*id);
        }
        Ok(existed)
    }

    fn delete_location(&mut self, id: &LocationId) -> StorageResult<bool> {
        let existed = self.working.locations.remove(id).is_some();
        if existed {
            self.staged_locations.delete(*id);
        }
        Ok(existed)
    }

    fn delete_category(&mut self, id: &CategoryId) -> StorageResult<bool> {
        let existed = self.working.categories.remove(id).is_some();
        if existed {
            self.staged_categories.delete(*id);
        }
        Ok(existed)
    }

    fn delete_all(&mut self, kind: EntityKind) -> StorageResult<usize> {
        match kind {
            EntityKind::Item => self.staged_items.purge(),
            EntityKind::Location => self.staged_locations.purge(),
            EntityKind::Category => self.staged_categories.purge(),
        }
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
        if !self.has_staged_changes() {
            return Ok(());
        }

        let tx = self
            .conn
            .transaction()
            .map_err(|e| StorageError::Commit(format!("failed to begin transaction: {e}")))?;

        let flushed = flush_locations(&tx, &self.staged_locations, &self.working.locations)
            .and_then(|()| flush_categories(&tx, &self.staged_categories, &self.working.categories))
            .and_then(|()| flush_items(&tx, &self.staged_items, &self.working.items));
        flushed
            .and_then(|()| tx.commit())
            .map_err(|e| StorageError::Commit(e.to_string()))?;

        self.clear_staged();
        debug!("Committed staged changes to SQLite");
        Ok(())
    }
}
