use super::inverse;
use super::sync_service::{KindSyncer, SyncError};
use crate::clients::remote::RemoteClient;
use crate::db::{RecordStore, StoreError, SyncedUpdate};
use crate::domain::{EntityKind, LocalId, LogStatus, RemoteId, SyncDirection, SyncStatus};
use crate::models::{NewRecord, NewSyncLogEntry, StoredRecord, Tracked};
use crate::registry::{EntitySchema, SyncEntity};
use crate::transcode::{SchemaTranscoder, TranscodeError, Transcoder};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ids known about the entity while an attempt runs; written to its log entry.
#[derive(Debug, Clone, Copy, Default)]
struct Attempt {
    local_id: Option<LocalId>,
    remote_id: Option<RemoteId>,
}

/// Push, pull and bidirectional sync for one entity type.
pub struct EntitySyncer<T: SyncEntity> {
    store: Arc<dyn RecordStore>,
    remote: Arc<dyn RemoteClient>,
    schema: Arc<EntitySchema<T>>,
    transcoder: Arc<dyn Transcoder<T>>,
    verify_inverse: bool,
}

impl<T: SyncEntity> EntitySyncer<T> {
    /// Syncer driven by the entity's registry table.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, remote: Arc<dyn RemoteClient>) -> Self {
        let schema = Arc::new(T::schema());
        let transcoder = Arc::new(SchemaTranscoder::new(schema.clone()));
        Self::with_transcoder(store, remote, schema, transcoder)
    }

    #[must_use]
    pub fn with_transcoder(
        store: Arc<dyn RecordStore>,
        remote: Arc<dyn RemoteClient>,
        schema: Arc<EntitySchema<T>>,
        transcoder: Arc<dyn Transcoder<T>>,
    ) -> Self {
        Self {
            store,
            remote,
            schema,
            transcoder,
            verify_inverse: false,
        }
    }

    #[must_use]
    pub const fn verify_inverse(mut self, enabled: bool) -> Self {
        self.verify_inverse = enabled;
        self
    }

    /// Sends the local entity to the CMS, creating the remote post on first push.
    pub async fn sync_to_remote(&self, id: LocalId) -> Result<Tracked<T>, SyncError> {
        decode(KindSyncer::push(self, id).await?)
    }

    /// Pulls a remote post into the local store, matching on remote id only.
    pub async fn sync_from_remote(&self, remote_id: RemoteId) -> Result<Tracked<T>, SyncError> {
        decode(KindSyncer::pull(self, remote_id).await?)
    }

    /// Push, then pull back what the CMS stored.
    pub async fn bidirectional_sync(&self, id: LocalId) -> Result<Tracked<T>, SyncError> {
        decode(KindSyncer::both(self, id).await?)
    }

    async fn run_push(&self, id: LocalId, attempt: &mut Attempt) -> Result<StoredRecord, SyncError> {
        let kind = T::KIND;
        let record = self
            .store
            .fetch(kind, id)
            .await?
            .ok_or(SyncError::NotFoundLocal { kind, id })?;
        attempt.remote_id = record.remote_id;

        let tracked: Tracked<T> = decode(record)?;
        let payload = self.transcoder.to_remote(&tracked.entity)?;

        let document = match tracked.remote_id {
            Some(remote_id) => {
                debug!(%kind, local_id = %id, %remote_id, "Updating remote post");
                self.remote.update(kind, remote_id, &payload).await?
            }
            None => {
                debug!(%kind, local_id = %id, "Creating remote post");
                let created = self.remote.create(kind, &payload).await?;
                attempt.remote_id = Some(created.id);
                // The id must be persisted before the record can count as synced.
                self.store
                    .link_remote_id(kind, id, created.id)
                    .await
                    .map_err(|e| link_conflict(kind, id, e))?;
                created
            }
        };

        let stored = self
            .store
            .mark_synced(
                kind,
                id,
                SyncedUpdate {
                    data: None,
                    remote_snapshot: document.body,
                    synced_at: Utc::now(),
                },
            )
            .await?;

        info!(%kind, local_id = %id, remote_id = ?stored.remote_id, "Pushed to remote");
        Ok(stored)
    }

    async fn run_pull(
        &self,
        remote_id: RemoteId,
        attempt: &mut Attempt,
    ) -> Result<StoredRecord, SyncError> {
        let kind = T::KIND;
        attempt.remote_id = Some(remote_id);

        let existing = self.store.fetch_by_remote_id(kind, remote_id).await?;
        attempt.local_id = existing.as_ref().map(|r| r.local_id);

        let document = self
            .remote
            .get(kind, remote_id)
            .await?
            .ok_or(SyncError::NotFoundRemote { kind, remote_id })?;

        let partial = self.transcoder.from_remote(&document.body)?;
        let synced_at = Utc::now();

        let stored = match existing {
            Some(record) => {
                let local_id = record.local_id;
                let mut tracked: Tracked<T> = decode(record)?;
                self.transcoder.merge(&mut tracked.entity, partial);
                let data = serde_json::to_value(&tracked.entity).map_err(TranscodeError::from)?;
                self.store
                    .mark_synced(
                        kind,
                        local_id,
                        SyncedUpdate {
                            data: Some(data),
                            remote_snapshot: document.body,
                            synced_at,
                        },
                    )
                    .await?
            }
            None => {
                let entity = self.transcoder.materialize(partial);
                let data = serde_json::to_value(&entity).map_err(TranscodeError::from)?;
                let created = self
                    .store
                    .create(NewRecord::pulled(kind, data, remote_id, document.body, synced_at))
                    .await?;
                attempt.local_id = Some(created.local_id);
                created
            }
        };

        info!(%kind, local_id = %stored.local_id, %remote_id, "Pulled from remote");
        Ok(stored)
    }

    async fn run_both(&self, id: LocalId, attempt: &mut Attempt) -> Result<StoredRecord, SyncError> {
        let pushed = KindSyncer::push(self, id).await?;
        attempt.remote_id = pushed.remote_id;

        let Some(remote_id) = pushed.remote_id else {
            return Ok(pushed);
        };
        let pulled = KindSyncer::pull(self, remote_id).await?;

        if self.verify_inverse {
            inverse::verify(self.remote.as_ref(), &self.schema, &pulled).await?;
        }

        Ok(pulled)
    }

    /// Writes the attempt's log entry and settles the record status on failure.
    async fn finish(
        &self,
        direction: SyncDirection,
        attempt: Attempt,
        result: &Result<StoredRecord, SyncError>,
    ) {
        let kind = T::KIND;
        let (local_id, remote_id) = match result {
            Ok(record) => (Some(record.local_id), record.remote_id),
            Err(_) => (attempt.local_id, attempt.remote_id),
        };
        let status = if result.is_ok() {
            LogStatus::Success
        } else {
            LogStatus::Failed
        };

        if let (Err(err), Some(local_id)) = (result, local_id) {
            warn!(%kind, %local_id, direction = %direction, error = %err, "Sync attempt failed");
            let settled = match err {
                SyncError::Conflict { .. } => SyncStatus::Conflict,
                _ => SyncStatus::Failed,
            };
            match self.store.set_status(kind, local_id, settled).await {
                Ok(()) | Err(StoreError::NotFound { .. }) => {}
                Err(e) => warn!(%kind, %local_id, error = %e, "Could not record sync status"),
            }
        } else if let Err(err) = result {
            warn!(%kind, remote_id = ?remote_id, direction = %direction, error = %err, "Sync attempt failed");
        }

        let entry = NewSyncLogEntry {
            entity_type: kind,
            local_id,
            remote_id,
            direction,
            status,
            error_message: result.as_ref().err().map(ToString::to_string),
            completed_at: Utc::now(),
        };
        if let Err(e) = self.store.append_log(entry).await {
            warn!(%kind, error = %e, "Could not write sync log entry");
        }

        metrics::counter!(
            "sync_attempts_total",
            "entity_type" => kind.as_str(),
            "direction" => direction.as_str(),
            "status" => status.as_str()
        )
        .increment(1);
    }
}

#[async_trait]
impl<T: SyncEntity> KindSyncer for EntitySyncer<T> {
    fn kind(&self) -> EntityKind {
        T::KIND
    }

    async fn push(&self, id: LocalId) -> Result<StoredRecord, SyncError> {
        let mut attempt = Attempt {
            local_id: Some(id),
            remote_id: None,
        };
        let result = self.run_push(id, &mut attempt).await;
        self.finish(SyncDirection::ToRemote, attempt, &result).await;
        result
    }

    async fn pull(&self, remote_id: RemoteId) -> Result<StoredRecord, SyncError> {
        let mut attempt = Attempt::default();
        let result = self.run_pull(remote_id, &mut attempt).await;
        self.finish(SyncDirection::FromRemote, attempt, &result).await;
        result
    }

    async fn both(&self, id: LocalId) -> Result<StoredRecord, SyncError> {
        let mut attempt = Attempt {
            local_id: Some(id),
            remote_id: None,
        };
        let result = self.run_both(id, &mut attempt).await;
        self.finish(SyncDirection::Bidirectional, attempt, &result).await;
        result
    }
}

fn decode<T: SyncEntity>(record: StoredRecord) -> Result<Tracked<T>, SyncError> {
    record
        .decode()
        .map_err(|e| SyncError::Transcode(TranscodeError::from(e)))
}

fn link_conflict(kind: EntityKind, local_id: LocalId, err: StoreError) -> SyncError {
    match err {
        StoreError::RemoteIdTaken {
            remote_id,
            local_id: holder,
            ..
        } => SyncError::Conflict {
            kind,
            local_id,
            reason: format!("remote id {remote_id} is already linked to local id {holder}"),
        },
        StoreError::AlreadyLinked { existing, .. } => SyncError::Conflict {
            kind,
            local_id,
            reason: format!("already linked to remote id {existing}"),
        },
        other => SyncError::Store(other),
    }
}
