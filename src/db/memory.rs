use super::{LogPage, LogQuery, RecordStore, StoreError, SyncedUpdate};
use crate::domain::{EntityKind, LocalId, RemoteId, SyncStatus};
use crate::models::{NewRecord, NewSyncLogEntry, StoredRecord, SyncLogEntry};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    records: BTreeMap<LocalId, StoredRecord>,
    logs: Vec<SyncLogEntry>,
    next_record_id: i64,
    next_log_id: i64,
}

impl Inner {
    fn record_mut(&mut self, kind: EntityKind, id: LocalId) -> Result<&mut StoredRecord, StoreError> {
        self.records
            .get_mut(&id)
            .filter(|r| r.kind == kind)
            .ok_or(StoreError::NotFound { kind, id })
    }

    fn holder_of(&self, kind: EntityKind, remote_id: RemoteId) -> Option<LocalId> {
        self.records
            .values()
            .find(|r| r.kind == kind && r.remote_id == Some(remote_id))
            .map(|r| r.local_id)
    }
}

/// Process-local [`RecordStore`] with the same linkage rules as the SQL store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every log entry in insertion order.
    pub async fn all_logs(&self) -> Vec<SyncLogEntry> {
        self.inner.lock().await.logs.clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(
        &self,
        kind: EntityKind,
        id: LocalId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.records.get(&id).filter(|r| r.kind == kind).cloned())
    }

    async fn fetch_by_remote_id(
        &self,
        kind: EntityKind,
        remote_id: RemoteId,
    ) -> Result<Option<StoredRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .values()
            .find(|r| r.kind == kind && r.remote_id == Some(remote_id))
            .cloned())
    }

    async fn list_records(
        &self,
        kind: EntityKind,
        status: Option<SyncStatus>,
    ) -> Result<Vec<StoredRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .records
            .values()
            .filter(|r| r.kind == kind && status.is_none_or(|s| r.sync_status == s))
            .cloned()
            .collect())
    }

    async fn create(&self, record: NewRecord) -> Result<StoredRecord, StoreError> {
        let mut inner = self.inner.lock().await;

        if let Some(remote_id) = record.remote_id
            && let Some(holder) = inner.holder_of(record.kind, remote_id)
        {
            return Err(StoreError::RemoteIdTaken {
                kind: record.kind,
                remote_id,
                local_id: holder,
            });
        }

        inner.next_record_id += 1;
        let stored = StoredRecord {
            kind: record.kind,
            local_id: LocalId::new(inner.next_record_id),
            remote_id: record.remote_id,
            sync_status: record.sync_status,
            last_synced_at: record.last_synced_at,
            remote_snapshot: record.remote_snapshot,
            entity: record.data,
        };
        inner.records.insert(stored.local_id, stored.clone());
        Ok(stored)
    }

    async fn link_remote_id(
        &self,
        kind: EntityKind,
        id: LocalId,
        remote_id: RemoteId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        match inner.record_mut(kind, id)?.remote_id {
            Some(existing) if existing == remote_id => return Ok(()),
            Some(existing) => {
                return Err(StoreError::AlreadyLinked {
                    kind,
                    local_id: id,
                    existing,
                });
            }
            None => {}
        }

        if let Some(holder) = inner.holder_of(kind, remote_id) {
            return Err(StoreError::RemoteIdTaken {
                kind,
                remote_id,
                local_id: holder,
            });
        }

        inner.record_mut(kind, id)?.remote_id = Some(remote_id);
        Ok(())
    }

    async fn mark_synced(
        &self,
        kind: EntityKind,
        id: LocalId,
        update: SyncedUpdate,
    ) -> Result<StoredRecord, StoreError> {
        let mut inner = self.inner.lock().await;
        let record = inner.record_mut(kind, id)?;

        if let Some(data) = update.data {
            record.entity = data;
        }
        record.remote_snapshot = Some(update.remote_snapshot);
        record.sync_status = SyncStatus::Synced;
        record.last_synced_at = Some(update.synced_at);
        Ok(record.clone())
    }

    async fn set_status(
        &self,
        kind: EntityKind,
        id: LocalId,
        status: SyncStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.record_mut(kind, id)?.sync_status = status;
        Ok(())
    }

    async fn append_log(&self, entry: NewSyncLogEntry) -> Result<SyncLogEntry, StoreError> {
        let mut inner = self.inner.lock().await;
        inner.next_log_id += 1;
        let stored = SyncLogEntry {
            id: inner.next_log_id,
            entity_type: entry.entity_type,
            local_id: entry.local_id,
            remote_id: entry.remote_id,
            direction: entry.direction,
            status: entry.status,
            error_message: entry.error_message,
            completed_at: entry.completed_at,
        };
        inner.logs.push(stored.clone());
        Ok(stored)
    }

    async fn recent_logs(&self, query: &LogQuery) -> Result<LogPage, StoreError> {
        let (page, page_size) = query.clamped();
        let inner = self.inner.lock().await;

        let mut matching: Vec<&SyncLogEntry> = inner
            .logs
            .iter()
            .filter(|e| query.entity_type.is_none_or(|k| e.entity_type == k))
            .filter(|e| query.status.is_none_or(|s| e.status == s))
            .collect();
        matching.sort_by(|a, b| b.completed_at.cmp(&a.completed_at).then(b.id.cmp(&a.id)));

        let total_pages = (matching.len() as u64).div_ceil(page_size);
        let offset = usize::try_from((page - 1) * page_size).unwrap_or(usize::MAX);
        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);

        Ok(LogPage {
            entries: matching
                .into_iter()
                .skip(offset)
                .take(limit)
                .cloned()
                .collect(),
            total_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LogStatus, SyncDirection};
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn remote_id_cannot_be_claimed_twice() {
        let store = MemoryStore::new();
        let a = store
            .create(NewRecord::unsynced(EntityKind::Movie, json!({ "title": "A" })))
            .await
            .unwrap();
        let b = store
            .create(NewRecord::unsynced(EntityKind::Movie, json!({ "title": "B" })))
            .await
            .unwrap();

        store
            .link_remote_id(EntityKind::Movie, a.local_id, RemoteId::new(501))
            .await
            .unwrap();

        let err = store
            .link_remote_id(EntityKind::Movie, b.local_id, RemoteId::new(501))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RemoteIdTaken { local_id, .. } if local_id == a.local_id));

        let err = store
            .link_remote_id(EntityKind::Movie, a.local_id, RemoteId::new(502))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyLinked { .. }));

        // Same id on a different kind is a different post.
        store
            .link_remote_id(EntityKind::Movie, b.local_id, RemoteId::new(502))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fetch_is_scoped_by_kind() {
        let store = MemoryStore::new();
        let actor = store
            .create(NewRecord::unsynced(EntityKind::Actor, json!({ "name": "Matt Hannon" })))
            .await
            .unwrap();

        assert!(store.fetch(EntityKind::Actor, actor.local_id).await.unwrap().is_some());
        assert!(store.fetch(EntityKind::Movie, actor.local_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn logs_are_newest_first_and_filterable() {
        let store = MemoryStore::new();
        let start = Utc::now();
        for (i, status) in [LogStatus::Success, LogStatus::Failed, LogStatus::Success]
            .into_iter()
            .enumerate()
        {
            store
                .append_log(NewSyncLogEntry {
                    entity_type: EntityKind::Movie,
                    local_id: Some(LocalId::new(1)),
                    remote_id: None,
                    direction: SyncDirection::ToRemote,
                    status,
                    error_message: None,
                    completed_at: start + Duration::seconds(i64::try_from(i).unwrap()),
                })
                .await
                .unwrap();
        }

        let page = store.recent_logs(&LogQuery::default()).await.unwrap();
        assert_eq!(page.entries.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(page.total_pages, 1);

        let failed = store
            .recent_logs(&LogQuery {
                status: Some(LogStatus::Failed),
                ..LogQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(failed.entries.len(), 1);

        let second = store
            .recent_logs(&LogQuery {
                page: 2,
                page_size: 2,
                ..LogQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(second.entries.len(), 1);
        assert_eq!(second.total_pages, 2);
    }
}
