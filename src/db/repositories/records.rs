use crate::db::{StoreError, SyncedUpdate};
use crate::domain::{EntityKind, LocalId, RemoteId, SyncStatus};
use crate::entities::{entity_records, prelude::*};
use crate::models::{NewRecord, StoredRecord};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};

pub struct RecordRepository {
    conn: DatabaseConnection,
}

impl TryFrom<entity_records::Model> for StoredRecord {
    type Error = StoreError;

    fn try_from(row: entity_records::Model) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, value: &str| {
            StoreError::Corrupt(format!("entity_records {}: {what} '{value}'", row.id))
        };

        Ok(Self {
            kind: row
                .entity_type
                .parse()
                .map_err(|_| corrupt("entity type", &row.entity_type))?,
            local_id: LocalId::new(row.id),
            remote_id: row.remote_id.map(RemoteId::new),
            sync_status: row
                .sync_status
                .parse()
                .map_err(|_| corrupt("sync status", &row.sync_status))?,
            last_synced_at: row.last_synced_at,
            remote_snapshot: row
                .remote_snapshot
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
            entity: serde_json::from_str(&row.data)?,
        })
    }
}

impl RecordRepository {
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn row(
        &self,
        kind: EntityKind,
        id: LocalId,
    ) -> Result<entity_records::Model, StoreError> {
        EntityRecords::find_by_id(id.value())
            .filter(entity_records::Column::EntityType.eq(kind.as_str()))
            .one(&self.conn)
            .await?
            .ok_or(StoreError::NotFound { kind, id })
    }

    pub async fn get(
        &self,
        kind: EntityKind,
        id: LocalId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        EntityRecords::find_by_id(id.value())
            .filter(entity_records::Column::EntityType.eq(kind.as_str()))
            .one(&self.conn)
            .await?
            .map(StoredRecord::try_from)
            .transpose()
    }

    pub async fn get_by_remote_id(
        &self,
        kind: EntityKind,
        remote_id: RemoteId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        EntityRecords::find()
            .filter(entity_records::Column::EntityType.eq(kind.as_str()))
            .filter(entity_records::Column::RemoteId.eq(remote_id.value()))
            .one(&self.conn)
            .await?
            .map(StoredRecord::try_from)
            .transpose()
    }

    pub async fn list(
        &self,
        kind: EntityKind,
        status: Option<SyncStatus>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let mut query = EntityRecords::find()
            .filter(entity_records::Column::EntityType.eq(kind.as_str()))
            .order_by_asc(entity_records::Column::Id);

        if let Some(status) = status {
            query = query.filter(entity_records::Column::SyncStatus.eq(status.as_str()));
        }

        query
            .all(&self.conn)
            .await?
            .into_iter()
            .map(StoredRecord::try_from)
            .collect()
    }

    pub async fn insert(&self, record: NewRecord) -> Result<StoredRecord, StoreError> {
        if let Some(remote_id) = record.remote_id {
            self.ensure_unclaimed(record.kind, remote_id, None).await?;
        }

        let now = Utc::now();
        let active_model = entity_records::ActiveModel {
            entity_type: Set(record.kind.as_str().to_string()),
            remote_id: Set(record.remote_id.map(RemoteId::value)),
            sync_status: Set(record.sync_status.as_str().to_string()),
            last_synced_at: Set(record.last_synced_at),
            remote_snapshot: Set(record
                .remote_snapshot
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?),
            data: Set(serde_json::to_string(&record.data)?),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        StoredRecord::try_from(model)
    }

    pub async fn link_remote_id(
        &self,
        kind: EntityKind,
        id: LocalId,
        remote_id: RemoteId,
    ) -> Result<(), StoreError> {
        let row = self.row(kind, id).await?;

        match row.remote_id {
            Some(existing) if existing == remote_id.value() => return Ok(()),
            Some(existing) => {
                return Err(StoreError::AlreadyLinked {
                    kind,
                    local_id: id,
                    existing: RemoteId::new(existing),
                });
            }
            None => {}
        }

        self.ensure_unclaimed(kind, remote_id, Some(id)).await?;

        let mut active: entity_records::ActiveModel = row.into();
        active.remote_id = Set(Some(remote_id.value()));
        active.updated_at = Set(Utc::now());

        match active.update(&self.conn).await {
            Ok(_) => Ok(()),
            // Lost a race against another writer claiming the same id.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let holder = self
                    .get_by_remote_id(kind, remote_id)
                    .await?
                    .map_or(LocalId::default(), |r| r.local_id);
                Err(StoreError::RemoteIdTaken {
                    kind,
                    remote_id,
                    local_id: holder,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_unclaimed(
        &self,
        kind: EntityKind,
        remote_id: RemoteId,
        claimant: Option<LocalId>,
    ) -> Result<(), StoreError> {
        match self.get_by_remote_id(kind, remote_id).await? {
            Some(holder) if Some(holder.local_id) != claimant => Err(StoreError::RemoteIdTaken {
                kind,
                remote_id,
                local_id: holder.local_id,
            }),
            _ => Ok(()),
        }
    }

    pub async fn mark_synced(
        &self,
        kind: EntityKind,
        id: LocalId,
        update: SyncedUpdate,
    ) -> Result<StoredRecord, StoreError> {
        let row = self.row(kind, id).await?;

        let mut active: entity_records::ActiveModel = row.into();
        if let Some(data) = &update.data {
            active.data = Set(serde_json::to_string(data)?);
        }
        active.remote_snapshot = Set(Some(serde_json::to_string(&update.remote_snapshot)?));
        active.sync_status = Set(SyncStatus::Synced.as_str().to_string());
        active.last_synced_at = Set(Some(update.synced_at));
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.conn).await?;
        StoredRecord::try_from(model)
    }

    pub async fn set_status(
        &self,
        kind: EntityKind,
        id: LocalId,
        status: SyncStatus,
    ) -> Result<(), StoreError> {
        let row = self.row(kind, id).await?;

        let mut active: entity_records::ActiveModel = row.into();
        active.sync_status = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.conn).await?;
        Ok(())
    }
}
