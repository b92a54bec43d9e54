//! Remote change sources.
//!
//! The engine only ever reads from the cloud. A source yields per-zone change
//! batches given a resumption cursor and reports the account status.

pub mod memory;
pub mod source;

pub use memory::MemoryChangeSource;
pub use source::{AccountStatus, RemoteChangeSource};
