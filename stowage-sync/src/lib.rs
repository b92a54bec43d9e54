//! Cloud change-reconciliation engine for Stowage.
//!
//! Pulls Item, Location and Category records from a read-only cloud
//! database and merges them into the local entity store, tolerating records
//! that arrive out of order, partially, or before the records they reference.
//!
//! ## Components
//!
//! - **Record**: the remote change unit (kind tag + field bag) and zones
//! - **Mapper**: turns one record into one local entity (create or update)
//! - **Pending**: stages item → location/category references until their
//!   targets exist locally
//! - **Engine**: runs a pass (fetch per zone, map, delete, resolve, commit)
//! - **Machine**: idle/syncing/success/error status, manual vs. automatic
//!   passes, periodic timer
//!
//! ## Sync Pass
//!
//! 1. **Fetch**: pull changes for each zone from its resumption cursor
//! 2. **Map**: apply modified records in delivery order
//! 3. **Link**: link references whose targets are already present
//! 4. **Delete**: apply record deletions and zone purges
//! 5. **Resolve**: retry every pending reference against the store
//! 6. **Commit**: persist the store; a failure is retried next pass
//!
//! # Example
//!
//! ```
//! use stowage_sync::{SyncConfig, Zone};
//!
//! let config = SyncConfig::from_json(r#"{"zones": ["Locations", "Items"]}"#).unwrap();
//! assert_eq!(config.zones, vec![Zone::Locations, Zone::Items]);
//! assert_eq!(config.auto_sync_interval_secs, 60);
//! ```

pub mod cloud;
mod config;
mod engine;
mod error;
pub mod machine;
pub mod mapper;
pub mod pending;
pub mod record;

pub use cloud::{AccountStatus, MemoryChangeSource, RemoteChangeSource};
pub use config::SyncConfig;
pub use engine::{PassReport, ReconciliationEngine};
pub use error::{SyncError, SyncResult};
pub use machine::{SyncSnapshot, SyncStateMachine, SyncStatus};
pub use mapper::{DesiredRelationships, MapOutcome, RecordMapper, SkipReason};
pub use pending::{PendingRelationship, PendingRelationshipTracker, ResolveReport};
pub use record::{fields, CloudRecord, FieldValue, RecordDeletion, Zone, ZoneChanges};
