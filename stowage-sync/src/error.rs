//! Error types for the sync layer.

use stowage_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The cloud account is signed out, restricted or unknown.
    #[error("cloud account unavailable")]
    AccountUnavailable,

    /// Another sync pass already holds the in-flight guard.
    #[error("a sync pass is already in progress")]
    PassInProgress,

    /// Fetching changes from the remote source failed.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Local storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
