mod common;

use common::{Harness, movie_post, samurai_cop};
use marquee::db::RecordStore;
use marquee::domain::{EntityKind, LogStatus, RemoteId, SyncDirection, SyncStatus};
use marquee::models::Movie;
use marquee::services::SyncOptions;
use serde_json::json;

fn paged(page_size: u32) -> Harness {
    Harness::with_options(SyncOptions {
        page_size,
        ..SyncOptions::default()
    })
}

#[tokio::test]
async fn bulk_pull_walks_every_page() {
    let h = paged(2);
    for id in 1..=5 {
        h.remote.insert(
            EntityKind::Movie,
            id,
            movie_post(&format!("Movie {id}"), "1990"),
        );
    }

    let report = h.engine.bulk_sync_from_remote(EntityKind::Movie).await;

    assert_eq!(report.direction, SyncDirection::FromRemote);
    assert_eq!(report.processed, 5);
    assert_eq!(report.succeeded, 5);
    assert_eq!(report.failed_count(), 0);
    assert_eq!(report.pages, 3);
    assert!(report.is_complete());
    assert!(!report.run_id.is_empty());

    let records = h.store.list_records(EntityKind::Movie, None).await.unwrap();
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.sync_status == SyncStatus::Synced));
}

#[tokio::test]
async fn bulk_pull_is_idempotent() {
    let h = paged(10);
    h.remote
        .insert(EntityKind::Actor, 3, json!({ "title": "Matt Hannon", "meta": {} }));

    h.engine.bulk_sync_from_remote(EntityKind::Actor).await;
    let report = h.engine.bulk_sync_from_remote(EntityKind::Actor).await;

    assert_eq!(report.succeeded, 1);
    let records = h.store.list_records(EntityKind::Actor, None).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].remote_id, Some(RemoteId::new(3)));
}

#[tokio::test]
async fn bulk_pull_continues_past_bad_items() {
    let h = paged(10);
    h.remote
        .insert(EntityKind::Movie, 1, movie_post("Samurai Cop", "1991"));
    let mut broken = movie_post("Broken", "1990");
    broken["meta"]["movie_rating"] = json!({ "stars": 3 });
    h.remote.insert(EntityKind::Movie, 2, broken);
    h.remote
        .insert(EntityKind::Movie, 3, movie_post("Miami Connection", "1987"));
    h.remote
        .add_listing_item(EntityKind::Movie, json!({ "title": "No id" }));

    let report = h.engine.bulk_sync_from_remote(EntityKind::Movie).await;

    assert_eq!(report.processed, 4);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed_count(), 2);
    assert_eq!(report.failed[0].remote_id, Some(RemoteId::new(2)));
    assert!(report.failed[0].message.contains("rating"));
    assert_eq!(report.failed[1].remote_id, None);

    // One log entry per item, failures included.
    let logs = h.store.all_logs().await;
    assert_eq!(logs.len(), 4);
    assert_eq!(
        logs.iter().filter(|e| e.status == LogStatus::Failed).count(),
        2
    );
}

#[tokio::test]
async fn listing_failure_ends_run_but_keeps_report() {
    let h = paged(2);
    for id in 1..=5 {
        h.remote.insert(
            EntityKind::Director,
            id,
            json!({ "title": format!("Director {id}"), "meta": {} }),
        );
    }
    h.remote.fail_page(2);

    let report = h.engine.bulk_sync_from_remote(EntityKind::Director).await;

    assert_eq!(report.processed, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.pages, 1);
    assert_eq!(report.interrupted_at_page, Some(2));
    assert!(report.interruption.as_deref().unwrap().contains("HTTP 500"));
    assert!(!report.is_complete());
    assert!(!h.remote.calls().contains(&"list director page 3".to_string()));
}

#[tokio::test]
async fn empty_collection_finishes_after_one_page() {
    let h = Harness::new();

    let report = h.engine.bulk_sync_from_remote(EntityKind::Experiment).await;

    assert_eq!(report.processed, 0);
    assert_eq!(report.pages, 1);
    assert!(report.is_complete());
}

#[tokio::test]
async fn bulk_push_skips_synced_records() {
    let h = Harness::new();
    let synced = h.add_movie(&samurai_cop()).await;
    h.engine.movies().sync_to_remote(synced).await.unwrap();
    h.add_movie(&Movie::new("Miami Connection")).await;
    h.add_movie(&Movie::new("Deadly Prey")).await;

    let report = h.engine.bulk_sync_to_remote(EntityKind::Movie).await.unwrap();

    assert_eq!(report.direction, SyncDirection::ToRemote);
    assert_eq!(report.processed, 2);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.pages, 0);
    assert_eq!(h.remote.count(EntityKind::Movie), 3);
}

#[tokio::test]
async fn bulk_push_reports_failures_and_retries_them_next_run() {
    let h = Harness::new();
    let a = h.add_movie(&samurai_cop()).await;
    let b = h.add_movie(&Movie::new("Deadly Prey")).await;
    h.remote.fail("create");

    let report = h.engine.bulk_sync_to_remote(EntityKind::Movie).await.unwrap();
    assert_eq!(report.failed_count(), 2);
    assert_eq!(report.failed[0].local_id, Some(a));
    assert_eq!(report.failed[1].local_id, Some(b));

    h.remote.recover("create");
    let retry = h.engine.bulk_sync_to_remote(EntityKind::Movie).await.unwrap();
    assert_eq!(retry.processed, 2);
    assert_eq!(retry.succeeded, 2);

    let failed = h
        .store
        .list_records(EntityKind::Movie, Some(SyncStatus::Failed))
        .await
        .unwrap();
    assert!(failed.is_empty());
}
