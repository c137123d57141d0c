//! Tracked records and sync log entries as the engine sees them.

use crate::domain::{EntityKind, LocalId, LogStatus, RemoteId, SyncDirection, SyncStatus};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A domain entity together with its synchronization bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracked<T> {
    pub kind: EntityKind,
    pub local_id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub sync_status: SyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Last raw payload received from the CMS, kept verbatim.
    pub remote_snapshot: Option<Value>,
    pub entity: T,
}

/// The untyped form the record store persists.
pub type StoredRecord = Tracked<Value>;

impl<T> Tracked<T> {
    /// Swaps the entity while keeping the bookkeeping fields.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tracked<U> {
        Tracked {
            kind: self.kind,
            local_id: self.local_id,
            remote_id: self.remote_id,
            sync_status: self.sync_status,
            last_synced_at: self.last_synced_at,
            remote_snapshot: self.remote_snapshot,
            entity: f(self.entity),
        }
    }

    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Synced)
    }
}

impl StoredRecord {
    /// Deserializes the stored entity document into its domain type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Tracked<T>, serde_json::Error> {
        let entity = serde_json::from_value(self.entity.clone())?;
        Ok(self.map(|_| entity))
    }
}

/// Insert request for the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub kind: EntityKind,
    pub data: Value,
    pub remote_id: Option<RemoteId>,
    pub sync_status: SyncStatus,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub remote_snapshot: Option<Value>,
}

impl NewRecord {
    /// A record authored locally that has never been pushed.
    #[must_use]
    pub const fn unsynced(kind: EntityKind, data: Value) -> Self {
        Self {
            kind,
            data,
            remote_id: None,
            sync_status: SyncStatus::Unsynced,
            last_synced_at: None,
            remote_snapshot: None,
        }
    }

    /// A record materialized by a pull; linked and synced from birth.
    #[must_use]
    pub const fn pulled(
        kind: EntityKind,
        data: Value,
        remote_id: RemoteId,
        snapshot: Value,
        synced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            data,
            remote_id: Some(remote_id),
            sync_status: SyncStatus::Synced,
            last_synced_at: Some(synced_at),
            remote_snapshot: Some(snapshot),
        }
    }
}

/// One row of the append-only operation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: i64,
    pub entity_type: EntityKind,
    pub local_id: Option<LocalId>,
    pub remote_id: Option<RemoteId>,
    pub direction: SyncDirection,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSyncLogEntry {
    pub entity_type: EntityKind,
    pub local_id: Option<LocalId>,
    pub remote_id: Option<RemoteId>,
    pub direction: SyncDirection,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub completed_at: DateTime<Utc>,
}
