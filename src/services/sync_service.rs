//! Sync engine facade.
//!
//! One [`EntitySyncer`] per entity kind does the work; [`SyncEngine`] owns
//! the four of them and dispatches by [`EntityKind`] for callers that only
//! know the kind at runtime (API, CLI, bulk runs).

use super::entity_syncer::EntitySyncer;
use crate::clients::ClientError;
use crate::clients::remote::RemoteClient;
use crate::db::{RecordStore, StoreError};
use crate::domain::{EntityKind, LocalId, RemoteId};
use crate::models::{Actor, Director, Experiment, Movie, StoredRecord};
use crate::transcode::TranscodeError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors from a single sync attempt.
///
/// Every variant is also recorded as a failed entry in the operation log
/// before it reaches the caller.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("no local {kind} with id {id}")]
    NotFoundLocal { kind: EntityKind, id: LocalId },

    #[error("no remote {kind} with id {remote_id}")]
    NotFoundRemote {
        kind: EntityKind,
        remote_id: RemoteId,
    },

    #[error(transparent)]
    Transport(#[from] ClientError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("{kind} {local_id} is in conflict: {reason}")]
    Conflict {
        kind: EntityKind,
        local_id: LocalId,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFoundLocal { .. } | Self::NotFoundRemote { .. }
        )
    }
}

/// Engine behavior switches, usually taken from `[sync]` in the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub page_size: u32,
    pub verify_inverse_relationships: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: crate::constants::limits::DEFAULT_PAGE_SIZE,
            verify_inverse_relationships: false,
        }
    }
}

impl From<&crate::config::SyncConfig> for SyncOptions {
    fn from(config: &crate::config::SyncConfig) -> Self {
        Self {
            page_size: config.page_size,
            verify_inverse_relationships: config.verify_inverse_relationships,
        }
    }
}

/// Kind-erased view of an [`EntitySyncer`].
#[async_trait]
pub trait KindSyncer: Send + Sync {
    fn kind(&self) -> EntityKind;

    async fn push(&self, id: LocalId) -> Result<StoredRecord, SyncError>;

    async fn pull(&self, remote_id: RemoteId) -> Result<StoredRecord, SyncError>;

    async fn both(&self, id: LocalId) -> Result<StoredRecord, SyncError>;
}

pub struct SyncEngine {
    pub(crate) store: Arc<dyn RecordStore>,
    pub(crate) remote: Arc<dyn RemoteClient>,
    pub(crate) options: SyncOptions,
    movies: EntitySyncer<Movie>,
    actors: EntitySyncer<Actor>,
    directors: EntitySyncer<Director>,
    experiments: EntitySyncer<Experiment>,
}

impl SyncEngine {
    #[must_use]
    pub fn new(
        store: Arc<dyn RecordStore>,
        remote: Arc<dyn RemoteClient>,
        options: SyncOptions,
    ) -> Self {
        let verify = options.verify_inverse_relationships;
        Self {
            movies: EntitySyncer::new(store.clone(), remote.clone()).verify_inverse(verify),
            actors: EntitySyncer::new(store.clone(), remote.clone()).verify_inverse(verify),
            directors: EntitySyncer::new(store.clone(), remote.clone()).verify_inverse(verify),
            experiments: EntitySyncer::new(store.clone(), remote.clone()).verify_inverse(verify),
            store,
            remote,
            options,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    #[must_use]
    pub const fn movies(&self) -> &EntitySyncer<Movie> {
        &self.movies
    }

    #[must_use]
    pub const fn actors(&self) -> &EntitySyncer<Actor> {
        &self.actors
    }

    #[must_use]
    pub const fn directors(&self) -> &EntitySyncer<Director> {
        &self.directors
    }

    #[must_use]
    pub const fn experiments(&self) -> &EntitySyncer<Experiment> {
        &self.experiments
    }

    pub(crate) fn for_kind(&self, kind: EntityKind) -> &dyn KindSyncer {
        match kind {
            EntityKind::Movie => &self.movies,
            EntityKind::Actor => &self.actors,
            EntityKind::Director => &self.directors,
            EntityKind::Experiment => &self.experiments,
        }
    }

    pub async fn sync_to_remote(
        &self,
        kind: EntityKind,
        id: LocalId,
    ) -> Result<StoredRecord, SyncError> {
        self.for_kind(kind).push(id).await
    }

    pub async fn sync_from_remote(
        &self,
        kind: EntityKind,
        remote_id: RemoteId,
    ) -> Result<StoredRecord, SyncError> {
        self.for_kind(kind).pull(remote_id).await
    }

    pub async fn bidirectional_sync(
        &self,
        kind: EntityKind,
        id: LocalId,
    ) -> Result<StoredRecord, SyncError> {
        self.for_kind(kind).both(id).await
    }
}
