use super::ClientError;
use crate::domain::{EntityKind, RemoteId};
use crate::transcode::RemotePayload;
use async_trait::async_trait;
use serde_json::Value;

/// A CMS document together with the post id it was stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: RemoteId,
    pub body: Value,
}

/// One page of a collection listing.
///
/// Items are left raw so the caller can report an item without an id as a
/// per-item failure instead of losing the whole page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemotePage {
    pub items: Vec<Value>,
    pub is_last_page: bool,
}

/// Document operations against the remote CMS.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// `Ok(None)` when the CMS has no post with that id.
    async fn get(&self, kind: EntityKind, id: RemoteId)
    -> Result<Option<RemoteDocument>, ClientError>;

    async fn create(
        &self,
        kind: EntityKind,
        payload: &RemotePayload,
    ) -> Result<RemoteDocument, ClientError>;

    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &RemotePayload,
    ) -> Result<RemoteDocument, ClientError>;

    /// Pages are 1-based. Asking past the end yields an empty last page.
    async fn list_page(
        &self,
        kind: EntityKind,
        page: u32,
        per_page: u32,
    ) -> Result<RemotePage, ClientError>;
}
