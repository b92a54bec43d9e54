//! In-memory change source.
//!
//! Serves queued change batches per zone, in order. Useful for tests and for
//! embedding the engine against data that did not come from a real cloud
//! database.

use super::source::{AccountStatus, RemoteChangeSource};
use crate::error::{SyncError, SyncResult};
use crate::record::{Zone, ZoneChanges};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct ZoneQueue {
    batches: VecDeque<ZoneChanges>,
    served: u64,
}

/// A [`RemoteChangeSource`] fed by the caller.
#[derive(Debug)]
pub struct MemoryChangeSource {
    zones: RwLock<HashMap<Zone, ZoneQueue>>,
    failures: RwLock<VecDeque<String>>,
    account: RwLock<AccountStatus>,
    /// Every fetch made, with the cursor it was given.
    fetch_log: RwLock<Vec<(Zone, Option<String>)>>,
}

impl Default for MemoryChangeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChangeSource {
    /// Creates an empty source with an available account.
    pub fn new() -> Self {
        Self {
            zones: RwLock::new(HashMap::new()),
            failures: RwLock::new(VecDeque::new()),
            account: RwLock::new(AccountStatus::Available),
            fetch_log: RwLock::new(Vec::new()),
        }
    }

    /// Queues a batch to be served by a later fetch of its zone.
    ///
    /// Batches without a cursor get one assigned when served.
    pub async fn push(&self, changes: ZoneChanges) {
        let mut zones = self.zones.write().await;
        zones
            .entry(changes.zone)
            .or_default()
            .batches
            .push_back(changes);
    }

    /// Makes the next fetch (of any zone) fail with the given message.
    pub async fn fail_next_fetch(&self, message: impl Into<String>) {
        self.failures.write().await.push_back(message.into());
    }

    pub async fn set_account_status(&self, status: AccountStatus) {
        *self.account.write().await = status;
    }

    /// Number of batches still queued across all zones.
    pub async fn queued(&self) -> usize {
        self.zones.read().await.values().map(|q| q.batches.len()).sum()
    }

    pub async fn fetch_log(&self) -> Vec<(Zone, Option<String>)> {
        self.fetch_log.read().await.clone()
    }
}

#[async_trait]
impl RemoteChangeSource for MemoryChangeSource {
    fn provider_name(&self) -> &'static str {
        "Memory"
    }

    async fn account_status(&self) -> SyncResult<AccountStatus> {
        Ok(*self.account.read().await)
    }

    async fn fetch_changes(&self, zone: Zone, cursor: Option<&str>) -> SyncResult<ZoneChanges> {
        self.fetch_log
            .write()
            .await
            .push((zone, cursor.map(str::to_string)));

        if let Some(message) = self.failures.write().await.pop_front() {
            return Err(SyncError::Fetch(message));
        }

        let mut zones = self.zones.write().await;
        let queue = zones.entry(zone).or_default();
        match queue.batches.pop_front() {
            Some(mut changes) => {
                queue.served += 1;
                if changes.next_cursor.is_none() {
                    changes.next_cursor = Some(format!("{}-{}", zone.name(), queue.served));
                }
                debug!(
                    "Serving {} modified / {} deleted records for zone {}",
                    changes.modified.len(),
                    changes.deleted.len(),
                    zone
                );
                Ok(changes)
            }
            None => {
                let mut changes = ZoneChanges::empty(zone);
                changes.next_cursor = cursor.map(str::to_string);
                Ok(changes)
            }
        }
    }
}
