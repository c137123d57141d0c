use crate::domain::{EntityKind, LocalId, LogStatus, RemoteId, SyncStatus};
use crate::models::{NewRecord, NewSyncLogEntry, StoredRecord, SyncLogEntry};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub mod memory;
pub mod migrator;
pub mod repositories;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("stored document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("no {kind} with local id {id}")]
    NotFound { kind: EntityKind, id: LocalId },

    #[error("remote id {remote_id} is already linked to {kind} {local_id}")]
    RemoteIdTaken {
        kind: EntityKind,
        remote_id: RemoteId,
        local_id: LocalId,
    },

    #[error("{kind} {local_id} is already linked to remote id {existing}")]
    AlreadyLinked {
        kind: EntityKind,
        local_id: LocalId,
        existing: RemoteId,
    },

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// What a successful sync writes back onto a record.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedUpdate {
    /// Replacement entity document; `None` keeps the current one.
    pub data: Option<Value>,
    pub remote_snapshot: Value,
    pub synced_at: DateTime<Utc>,
}

/// Filters for reading the operation log. Pages are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub page: u64,
    pub page_size: u64,
    pub entity_type: Option<EntityKind>,
    pub status: Option<LogStatus>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: crate::constants::limits::DEFAULT_LOG_PAGE_SIZE,
            entity_type: None,
            status: None,
        }
    }
}

impl LogQuery {
    pub(crate) fn clamped(&self) -> (u64, u64) {
        (
            self.page.max(1),
            self.page_size
                .clamp(1, crate::constants::limits::MAX_LOG_PAGE_SIZE),
        )
    }
}

/// Newest entries first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogPage {
    pub entries: Vec<SyncLogEntry>,
    pub total_pages: u64,
}

/// Persistence for tracked records and the operation log.
///
/// The sync engine only ever holds an `Arc<dyn RecordStore>`; the SeaORM
/// [`Store`] backs production and [`MemoryStore`] backs tests.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn fetch(&self, kind: EntityKind, id: LocalId)
    -> Result<Option<StoredRecord>, StoreError>;

    async fn fetch_by_remote_id(
        &self,
        kind: EntityKind,
        remote_id: RemoteId,
    ) -> Result<Option<StoredRecord>, StoreError>;

    /// All records of a kind, optionally narrowed to one status, oldest first.
    async fn list_records(
        &self,
        kind: EntityKind,
        status: Option<SyncStatus>,
    ) -> Result<Vec<StoredRecord>, StoreError>;

    async fn create(&self, record: NewRecord) -> Result<StoredRecord, StoreError>;

    /// Links an unlinked record to a remote id. Relinking to a different id
    /// and claiming an id another record holds are both rejected.
    async fn link_remote_id(
        &self,
        kind: EntityKind,
        id: LocalId,
        remote_id: RemoteId,
    ) -> Result<(), StoreError>;

    async fn mark_synced(
        &self,
        kind: EntityKind,
        id: LocalId,
        update: SyncedUpdate,
    ) -> Result<StoredRecord, StoreError>;

    async fn set_status(
        &self,
        kind: EntityKind,
        id: LocalId,
        status: SyncStatus,
    ) -> Result<(), StoreError>;

    async fn append_log(&self, entry: NewSyncLogEntry) -> Result<SyncLogEntry, StoreError>;

    async fn recent_logs(&self, query: &LogQuery) -> Result<LogPage, StoreError>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self, StoreError> {
        Self::with_pool_options(db_url, 5).await
    }

    pub async fn with_pool_options(db_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .map_err(|e| StoreError::Database(DbErr::Custom(e.to_string())))?;
            }
        }

        // Every pooled connection to `:memory:` would be its own empty database.
        let max_connections = if in_memory { 1 } else { max_connections.max(1) };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool max: {})",
            max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn records_repo(&self) -> repositories::records::RecordRepository {
        repositories::records::RecordRepository::new(self.conn.clone())
    }

    fn logs_repo(&self) -> repositories::sync_logs::SyncLogRepository {
        repositories::sync_logs::SyncLogRepository::new(self.conn.clone())
    }
}

#[async_trait]
impl RecordStore for Store {
    async fn fetch(
        &self,
        kind: EntityKind,
        id: LocalId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        self.records_repo().get(kind, id).await
    }

    async fn fetch_by_remote_id(
        &self,
        kind: EntityKind,
        remote_id: RemoteId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        self.records_repo().get_by_remote_id(kind, remote_id).await
    }

    async fn list_records(
        &self,
        kind: EntityKind,
        status: Option<SyncStatus>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        self.records_repo().list(kind, status).await
    }

    async fn create(&self, record: NewRecord) -> Result<StoredRecord, StoreError> {
        self.records_repo().insert(record).await
    }

    async fn link_remote_id(
        &self,
        kind: EntityKind,
        id: LocalId,
        remote_id: RemoteId,
    ) -> Result<(), StoreError> {
        self.records_repo().link_remote_id(kind, id, remote_id).await
    }

    async fn mark_synced(
        &self,
        kind: EntityKind,
        id: LocalId,
        update: SyncedUpdate,
    ) -> Result<StoredRecord, StoreError> {
        self.records_repo().mark_synced(kind, id, update).await
    }

    async fn set_status(
        &self,
        kind: EntityKind,
        id: LocalId,
        status: SyncStatus,
    ) -> Result<(), StoreError> {
        self.records_repo().set_status(kind, id, status).await
    }

    async fn append_log(&self, entry: NewSyncLogEntry) -> Result<SyncLogEntry, StoreError> {
        self.logs_repo().add(entry).await
    }

    async fn recent_logs(&self, query: &LogQuery) -> Result<LogPage, StoreError> {
        self.logs_repo().get_logs(query).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Self::ping(self).await
    }
}
