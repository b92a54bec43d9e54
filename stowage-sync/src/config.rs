//! Sync configuration.

use crate::error::{SyncError, SyncResult};
use crate::record::Zone;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Configuration for the reconciliation engine and its scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Identifier of the cloud container the zones live in.
    pub container_id: String,
    /// Zones fetched by each pass, in order.
    pub zones: Vec<Zone>,
    /// Interval between automatic passes (seconds).
    pub auto_sync_interval_secs: u64,
    /// Delay before a success/error status falls back to idle (ms, 0 disables).
    pub status_reset_after_ms: u64,
    /// Message shown when a manual sync is rejected for lack of an account.
    pub account_unavailable_message: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            container_id: "iCloud.com.stowage.app".to_string(),
            zones: Zone::ALL.to_vec(),
            auto_sync_interval_secs: 60,
            status_reset_after_ms: 3_000,
            account_unavailable_message: "iCloud account is not available".to_string(),
        }
    }
}

impl SyncConfig {
    /// Parses a configuration from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> SyncResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.zones.is_empty() {
            return Err(SyncError::Config("no zones configured".to_string()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.zones.iter().find(|z| !seen.insert(**z)) {
            return Err(SyncError::Config(format!("zone {dup} listed twice")));
        }
        if self.auto_sync_interval_secs == 0 {
            return Err(SyncError::Config(
                "auto_sync_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn auto_sync_interval(&self) -> Duration {
        Duration::from_secs(self.auto_sync_interval_secs)
    }

    pub fn status_reset_after(&self) -> Option<Duration> {
        (self.status_reset_after_ms > 0).then(|| Duration::from_millis(self.status_reset_after_ms))
    }
}
