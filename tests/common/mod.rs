#![allow(dead_code)]

use async_trait::async_trait;
use marquee::clients::ClientError;
use marquee::clients::remote::{RemoteClient, RemoteDocument, RemotePage};
use marquee::db::{MemoryStore, RecordStore};
use marquee::domain::{EntityKind, LocalId, RemoteId};
use marquee::models::{Movie, NewRecord};
use marquee::services::{SyncEngine, SyncOptions};
use marquee::transcode::RemotePayload;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Posts {
    by_key: BTreeMap<(EntityKind, i64), Value>,
    next_id: i64,
}

/// In-memory CMS with scripted failures.
#[derive(Default)]
pub struct FakeRemote {
    posts: Mutex<Posts>,
    /// Operations that fail with HTTP 500: "get", "create", "update".
    failing: Mutex<HashSet<&'static str>>,
    /// Listing pages that fail with HTTP 500.
    failing_pages: Mutex<HashSet<u32>>,
    /// Id handed out by the next create instead of a fresh one.
    next_create_id: Mutex<Option<i64>>,
    /// Items appended verbatim to the listing of a kind.
    extra_listing: Mutex<Vec<(EntityKind, Value)>>,
    /// Meta the CMS fills in on every write of a kind, whatever was sent.
    computed_meta: Mutex<Vec<(EntityKind, &'static str, Value)>>,
    calls: Mutex<Vec<String>>,
}

fn server_error(message: &str) -> ClientError {
    ClientError::Status {
        service: "WordPress",
        status: 500,
        message: message.to_string(),
    }
}

impl FakeRemote {
    pub fn new() -> Arc<Self> {
        let remote = Self::default();
        remote.posts.lock().unwrap().next_id = 100;
        Arc::new(remote)
    }

    /// Seeds a post; `body` gets its `id` filled in.
    pub fn insert(&self, kind: EntityKind, id: i64, mut body: Value) {
        body["id"] = json!(id);
        let mut posts = self.posts.lock().unwrap();
        posts.by_key.insert((kind, id), body);
        posts.next_id = posts.next_id.max(id + 1);
    }

    /// Deletes a post behind the engine's back.
    pub fn remove(&self, kind: EntityKind, id: i64) {
        self.posts.lock().unwrap().by_key.remove(&(kind, id));
    }

    /// Overwrites one meta field of a stored post.
    pub fn set_meta(&self, kind: EntityKind, id: i64, key: &str, value: Value) {
        let mut posts = self.posts.lock().unwrap();
        let post = posts.by_key.get_mut(&(kind, id)).expect("post exists");
        post["meta"][key] = value;
    }

    /// Makes every create or update of `kind` store `key` as `value`.
    pub fn compute_meta(&self, kind: EntityKind, key: &'static str, value: Value) {
        self.computed_meta.lock().unwrap().push((kind, key, value));
    }

    pub fn post(&self, kind: EntityKind, id: i64) -> Option<Value> {
        self.posts.lock().unwrap().by_key.get(&(kind, id)).cloned()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.posts
            .lock()
            .unwrap()
            .by_key
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }

    pub fn fail(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().unwrap().remove(operation);
    }

    pub fn fail_page(&self, page: u32) {
        self.failing_pages.lock().unwrap().insert(page);
    }

    pub fn hand_out_id(&self, id: i64) {
        *self.next_create_id.lock().unwrap() = Some(id);
    }

    pub fn add_listing_item(&self, kind: EntityKind, item: Value) {
        self.extra_listing.lock().unwrap().push((kind, item));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn apply_computed(&self, kind: EntityKind, body: &mut Value) {
        for (k, key, value) in self.computed_meta.lock().unwrap().iter() {
            if *k == kind {
                body["meta"][*key] = value.clone();
            }
        }
    }

    fn check(&self, operation: &'static str) -> Result<(), ClientError> {
        if self.failing.lock().unwrap().contains(operation) {
            Err(server_error(&format!("{operation} is down")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn get(
        &self,
        kind: EntityKind,
        id: RemoteId,
    ) -> Result<Option<RemoteDocument>, ClientError> {
        self.record(format!("get {kind} {id}"));
        self.check("get")?;
        Ok(self.post(kind, id.value()).map(|body| RemoteDocument { id, body }))
    }

    async fn create(
        &self,
        kind: EntityKind,
        payload: &RemotePayload,
    ) -> Result<RemoteDocument, ClientError> {
        self.record(format!("create {kind}"));
        self.check("create")?;

        let forced = self.next_create_id.lock().unwrap().take();
        let id = {
            let mut posts = self.posts.lock().unwrap();
            let id = forced.unwrap_or(posts.next_id);
            posts.next_id = posts.next_id.max(id + 1);
            id
        };

        let mut body = payload.to_value();
        body["id"] = json!(id);
        self.apply_computed(kind, &mut body);
        self.posts
            .lock()
            .unwrap()
            .by_key
            .insert((kind, id), body.clone());

        Ok(RemoteDocument {
            id: RemoteId::new(id),
            body,
        })
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &RemotePayload,
    ) -> Result<RemoteDocument, ClientError> {
        self.record(format!("update {kind} {id}"));
        self.check("update")?;

        let mut posts = self.posts.lock().unwrap();
        let Some(existing) = posts.by_key.get_mut(&(kind, id.value())) else {
            return Err(ClientError::Status {
                service: "WordPress",
                status: 404,
                message: "Invalid post ID.".to_string(),
            });
        };

        let mut body = payload.to_value();
        body["id"] = json!(id.value());
        // Fields the CMS computes itself survive an update.
        if let (Some(old_meta), Some(new_meta)) = (
            existing.get("meta").and_then(Value::as_object).cloned(),
            body.get_mut("meta").and_then(Value::as_object_mut),
        ) {
            for (key, value) in old_meta {
                new_meta.entry(key).or_insert(value);
            }
        }
        self.apply_computed(kind, &mut body);
        *existing = body.clone();

        Ok(RemoteDocument { id, body })
    }

    async fn list_page(
        &self,
        kind: EntityKind,
        page: u32,
        per_page: u32,
    ) -> Result<RemotePage, ClientError> {
        self.record(format!("list {kind} page {page}"));
        if self.failing_pages.lock().unwrap().contains(&page) {
            return Err(server_error("listing is down"));
        }

        let mut all: Vec<Value> = self
            .posts
            .lock()
            .unwrap()
            .by_key
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, body)| body.clone())
            .collect();
        all.extend(
            self.extra_listing
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, item)| item.clone()),
        );

        let per_page = per_page.max(1) as usize;
        let start = (page.saturating_sub(1) as usize) * per_page;
        let items: Vec<Value> = all.iter().skip(start).take(per_page).cloned().collect();
        let is_last_page = start + per_page >= all.len();

        Ok(RemotePage {
            items,
            is_last_page,
        })
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub remote: Arc<FakeRemote>,
    pub engine: SyncEngine,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_options(SyncOptions::default())
    }

    pub fn with_options(options: SyncOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let remote = FakeRemote::new();
        let engine = SyncEngine::new(store.clone(), remote.clone(), options);
        Self {
            store,
            remote,
            engine,
        }
    }

    pub async fn add_movie(&self, movie: &Movie) -> LocalId {
        self.store
            .create(NewRecord::unsynced(
                EntityKind::Movie,
                serde_json::to_value(movie).unwrap(),
            ))
            .await
            .unwrap()
            .local_id
    }
}

pub fn samurai_cop() -> Movie {
    Movie {
        release_year: Some("1991".to_string()),
        imdb_id: Some("tt0130236".to_string()),
        genres: vec!["Action".to_string(), "Crime".to_string()],
        movie_actors: vec!["Matt Hannon".to_string(), "Robert Z'Dar".to_string()],
        ..Movie::new("Samurai Cop")
    }
}

/// A movie post the way Pods returns it with `context=edit`.
pub fn movie_post(title: &str, year: &str) -> Value {
    json!({
        "title": { "raw": title, "rendered": title },
        "slug": title.to_lowercase().replace(' ', "-"),
        "status": "publish",
        "meta": {
            "movie_year": year,
            "movie_genres": ["Action"],
            "movie_actors": [],
        }
    })
}
