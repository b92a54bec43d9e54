//! Core type definitions for Stowage.
//!
//! This crate defines the inventory entities mirrored from the cloud and the
//! identifiers they are keyed by:
//! - Item, Location and Category identifiers (UUID newtypes)
//! - The entity structs held by the local store
//! - Encoded colors as delivered by the remote schema
//!
//! Sync-specific types (remote records, zones, pending relationships) live in
//! `stowage-sync`.

mod entity;
mod ids;

pub use entity::{Category, Color, EntityKind, Item, Location};
pub use ids::{CategoryId, ItemId, LocationId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("unknown entity kind: {0}")]
    UnknownKind(String),
}
