mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use common::{FakeRemote, movie_post, samurai_cop};
use http_body_util::BodyExt;
use marquee::api::{AppState, router};
use marquee::config::Config;
use marquee::db::{MemoryStore, RecordStore};
use marquee::domain::EntityKind;
use marquee::models::NewRecord;
use marquee::services::EnrichmentService;
use marquee::state::SharedState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryStore>,
    remote: Arc<FakeRemote>,
}

fn spawn_app_with(config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let remote = FakeRemote::new();
    // No API keys configured: details requests fail as not configured.
    let enrichment = Arc::new(EnrichmentService::from_config(&config.metadata));

    let shared = SharedState::from_parts(config, store.clone(), remote.clone(), enrichment);
    TestApp {
        router: router(AppState::new(shared, None)),
        store,
        remote,
    }
}

fn spawn_app() -> TestApp {
    spawn_app_with(Config::default())
}

async fn call(app: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn seed_movie(store: &MemoryStore) -> i64 {
    store
        .create(NewRecord::unsynced(
            EntityKind::Movie,
            serde_json::to_value(samurai_cop()).unwrap(),
        ))
        .await
        .unwrap()
        .local_id
        .value()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = spawn_app();

    let (status, body) = call(&app.router, "GET", "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], true);
}

#[tokio::test]
async fn push_endpoint_returns_synced_record() {
    let app = spawn_app();
    let id = seed_movie(&app.store).await;

    let (status, body) = call(&app.router, "POST", &format!("/api/sync/movies/{id}/push")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["local_id"], id);
    assert_eq!(body["data"]["sync_status"], "synced");
    assert_eq!(body["data"]["remote_id"], 100);
    assert_eq!(body["data"]["data"]["title"], "Samurai Cop");
}

#[tokio::test]
async fn bidirectional_endpoint_syncs_both_ways() {
    let app = spawn_app();
    let id = seed_movie(&app.store).await;

    let (status, body) = call(
        &app.router,
        "POST",
        &format!("/api/sync/movie/{id}/bidirectional"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sync_status"], "synced");
    assert_eq!(app.store.all_logs().await.len(), 3);
}

#[tokio::test]
async fn pull_endpoint_materializes_remote_post() {
    let app = spawn_app();
    app.remote
        .insert(EntityKind::Movie, 77, movie_post("Deadly Prey", "1987"));

    let (status, body) = call(&app.router, "POST", "/api/sync/movie/remote/77/pull").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["remote_id"], 77);
    assert_eq!(body["data"]["data"]["title"], "Deadly Prey");
}

#[tokio::test]
async fn sync_errors_map_to_status_codes() {
    let app = spawn_app();

    let (status, body) = call(&app.router, "POST", "/api/sync/studios/1/push").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = call(&app.router, "POST", "/api/sync/movie/999/push").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app.router, "POST", "/api/sync/actor/remote/5/pull").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let id = seed_movie(&app.store).await;
    app.remote.fail("create");
    let (status, body) = call(&app.router, "POST", &format!("/api/sync/movie/{id}/push")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("WordPress"));
}

#[tokio::test]
async fn claimed_remote_id_is_a_conflict() {
    let app = spawn_app();
    let first = seed_movie(&app.store).await;
    call(&app.router, "POST", &format!("/api/sync/movie/{first}/push")).await;

    let second = seed_movie(&app.store).await;
    app.remote.hand_out_id(100);
    let (status, _) = call(&app.router, "POST", &format!("/api/sync/movie/{second}/push")).await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bulk_pull_endpoint_returns_report() {
    let app = spawn_app();
    app.remote
        .insert(EntityKind::Movie, 1, movie_post("Samurai Cop", "1991"));
    app.remote
        .insert(EntityKind::Movie, 2, movie_post("Miami Connection", "1987"));

    let (status, body) = call(&app.router, "POST", "/api/sync/movies/bulk-pull").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["processed"], 2);
    assert_eq!(body["data"]["succeeded"], 2);
    assert_eq!(body["data"]["direction"], "from_remote");
    assert!(body["data"]["interrupted_at_page"].is_null());
}

#[tokio::test]
async fn logs_endpoint_filters_and_pages() {
    let app = spawn_app();
    let id = seed_movie(&app.store).await;
    call(&app.router, "POST", &format!("/api/sync/movie/{id}/push")).await;
    call(&app.router, "POST", "/api/sync/movie/999/push").await;
    call(&app.router, "POST", "/api/sync/actor/remote/3/pull").await;

    let (status, body) = call(&app.router, "GET", "/api/sync/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["logs"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["total_pages"], 1);

    let (_, body) = call(&app.router, "GET", "/api/sync/logs?status=failed").await;
    assert_eq!(body["data"]["logs"].as_array().unwrap().len(), 2);

    let (_, body) = call(
        &app.router,
        "GET",
        "/api/sync/logs?entity_type=actor&status=failed",
    )
    .await;
    let logs = body["data"]["logs"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["direction"], "from_remote");

    let (_, body) = call(&app.router, "GET", "/api/sync/logs?page=2&page_size=2").await;
    assert_eq!(body["data"]["logs"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total_pages"], 2);

    let (status, _) = call(&app.router, "GET", "/api/sync/logs?status=pending").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn movie_details_without_api_key_is_unavailable() {
    let app = spawn_app();

    let (status, body) = call(&app.router, "GET", "/api/movies/18079/details").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("tmdb_api_key"));

    let (status, _) = call(&app.router, "GET", "/api/movies/0/details").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_route_follows_config() {
    let app = spawn_app();
    let (status, _) = call(&app.router, "GET", "/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let mut config = Config::default();
    config.observability.metrics_enabled = false;
    let app = spawn_app_with(config);
    let (status, _) = call(&app.router, "GET", "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
