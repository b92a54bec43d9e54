//! Local entity storage for Stowage.
//!
//! The sync engine never owns storage; it mutates entities through the
//! [`EntityStore`] trait and asks the store to commit at the end of a pass.
//!
//! # Architecture
//!
//! - Both stores keep a working set of entities in memory; reads and writes
//!   go against it
//! - `commit` is the only point where changes become durable (and, for
//!   readers, visible)
//! - A failed commit keeps the staged changes so the next commit retries them
//!
//! Two implementations are provided: [`MemoryStore`] for tests and embedding,
//! and [`SqliteStore`] for on-disk persistence.

mod error;
mod memory;
mod sqlite;
mod store;
mod working;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::EntityStore;
