//! Remote change source abstraction.

use crate::error::SyncResult;
use crate::record::{Zone, ZoneChanges};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Availability of the cloud account backing a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Available,
    Unavailable,
    /// Status could not be determined; treated as unavailable.
    Unknown,
}

impl AccountStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, AccountStatus::Available)
    }
}

/// Read-only access to a cloud database partitioned into zones.
///
/// Retrying transient failures is the source's business; an error returned
/// from `fetch_changes` ends the current pass.
#[async_trait]
pub trait RemoteChangeSource: Send + Sync {
    /// Returns the name of the backing provider.
    fn provider_name(&self) -> &'static str;

    /// Reports whether the account is signed in and usable.
    async fn account_status(&self) -> SyncResult<AccountStatus>;

    /// Fetches changes for one zone since `cursor` (`None` means from the
    /// beginning).
    async fn fetch_changes(&self, zone: Zone, cursor: Option<&str>) -> SyncResult<ZoneChanges>;
}
