use crate::db::{LogPage, LogQuery, StoreError};
use crate::domain::{LocalId, RemoteId};
use crate::entities::{prelude::*, sync_logs};
use crate::models::{NewSyncLogEntry, SyncLogEntry};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

pub struct SyncLogRepository {
    conn: DatabaseConnection,
}

impl TryFrom<sync_logs::Model> for SyncLogEntry {
    type Error = StoreError;

    fn try_from(row: sync_logs::Model) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, value: &str| {
            StoreError::Corrupt(format!("sync_logs {}: {what} '{value}'", row.id))
        };

        Ok(Self {
            id: row.id,
            entity_type: row
                .entity_type
                .parse()
                .map_err(|_| corrupt("entity type", &row.entity_type))?,
            local_id: row.local_id.map(LocalId::new),
            remote_id: row.remote_id.map(RemoteId::new),
            direction: row
                .direction
                .parse()
                .map_err(|_| corrupt("direction", &row.direction))?,
            status: row
                .status
                .parse()
                .map_err(|_| corrupt("status", &row.status))?,
            error_message: row.error_message,
            completed_at: row.completed_at,
        })
    }
}

impl SyncLogRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn add(&self, entry: NewSyncLogEntry) -> Result<SyncLogEntry, StoreError> {
        let active_model = sync_logs::ActiveModel {
            entity_type: Set(entry.entity_type.as_str().to_string()),
            local_id: Set(entry.local_id.map(LocalId::value)),
            remote_id: Set(entry.remote_id.map(RemoteId::value)),
            direction: Set(entry.direction.as_str().to_string()),
            status: Set(entry.status.as_str().to_string()),
            error_message: Set(entry.error_message),
            completed_at: Set(entry.completed_at),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        SyncLogEntry::try_from(model)
    }

    pub async fn get_logs(&self, query: &LogQuery) -> Result<LogPage, StoreError> {
        let (page, page_size) = query.clamped();

        // Ties on completed_at fall back to insertion order.
        let mut select = SyncLogs::find()
            .order_by_desc(sync_logs::Column::CompletedAt)
            .order_by_desc(sync_logs::Column::Id);

        if let Some(kind) = query.entity_type {
            select = select.filter(sync_logs::Column::EntityType.eq(kind.as_str()));
        }

        if let Some(status) = query.status {
            select = select.filter(sync_logs::Column::Status.eq(status.as_str()));
        }

        let paginator = select.paginate(&self.conn, page_size);
        let total_pages = paginator.num_pages().await?;
        let entries = paginator
            .fetch_page(page - 1)
            .await?
            .into_iter()
            .map(SyncLogEntry::try_from)
            .collect::<Result<_, _>>()?;

        Ok(LogPage {
            entries,
            total_pages,
        })
    }
}
