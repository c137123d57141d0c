use serde::{Deserialize, Serialize};

use crate::domain::{EntityKind, LocalId, RemoteId, SyncStatus};
use crate::models::{StoredRecord, SyncLogEntry};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub database: bool,
}

/// A tracked record as returned by the sync endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecordDto {
    pub kind: EntityKind,
    pub local_id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub sync_status: SyncStatus,
    pub last_synced_at: Option<String>,
    pub data: serde_json::Value,
}

impl From<StoredRecord> for RecordDto {
    fn from(record: StoredRecord) -> Self {
        Self {
            kind: record.kind,
            local_id: record.local_id,
            remote_id: record.remote_id,
            sync_status: record.sync_status,
            last_synced_at: record.last_synced_at.map(|t| t.to_rfc3339()),
            data: record.entity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogResponse {
    pub logs: Vec<SyncLogEntry>,
    pub total_pages: u64,
}
