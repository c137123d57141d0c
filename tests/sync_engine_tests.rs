mod common;

use common::{Harness, movie_post, samurai_cop};
use marquee::db::RecordStore;
use marquee::domain::{EntityKind, LocalId, LogStatus, RemoteId, SyncDirection, SyncStatus};
use marquee::models::{Experiment, Movie, NewRecord};
use marquee::services::{SyncError, SyncOptions};
use serde_json::json;

#[tokio::test]
async fn push_creates_remote_post_and_links_it() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;

    let tracked = h.engine.movies().sync_to_remote(id).await.unwrap();

    let remote_id = tracked.remote_id.expect("remote id is linked");
    assert_eq!(tracked.sync_status, SyncStatus::Synced);
    assert!(tracked.last_synced_at.is_some());
    assert_eq!(tracked.entity.title, "Samurai Cop");

    let post = h.remote.post(EntityKind::Movie, remote_id.value()).unwrap();
    assert_eq!(post["title"], "Samurai Cop");
    assert_eq!(post["status"], "publish");
    assert_eq!(post["meta"]["movie_year"], "1991");
    assert_eq!(post["meta"]["movie_genres"], json!(["Action", "Crime"]));

    let logs = h.store.all_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].direction, SyncDirection::ToRemote);
    assert_eq!(logs[0].status, LogStatus::Success);
    assert_eq!(logs[0].local_id, Some(id));
    assert_eq!(logs[0].remote_id, Some(remote_id));
}

#[tokio::test]
async fn second_push_updates_instead_of_creating() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;

    let first = h.engine.movies().sync_to_remote(id).await.unwrap();
    let second = h.engine.movies().sync_to_remote(id).await.unwrap();

    assert_eq!(first.remote_id, second.remote_id);
    assert_eq!(h.remote.count(EntityKind::Movie), 1);

    let calls = h.remote.calls();
    assert_eq!(calls[0], "create movie");
    assert_eq!(calls[1], format!("update movie {}", first.remote_id.unwrap()));
}

#[tokio::test]
async fn push_of_unknown_record_is_logged_as_failure() {
    let h = Harness::new();

    let err = h
        .engine
        .sync_to_remote(EntityKind::Movie, LocalId::new(404))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::NotFoundLocal { .. }));
    assert!(err.is_not_found());

    let logs = h.store.all_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, LogStatus::Failed);
    assert_eq!(logs[0].local_id, Some(LocalId::new(404)));
    assert!(logs[0].error_message.as_deref().unwrap().contains("404"));
}

#[tokio::test]
async fn transport_failure_marks_record_failed() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;
    h.remote.fail("create");

    let err = h.engine.movies().sync_to_remote(id).await.unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));

    let record = h.store.fetch(EntityKind::Movie, id).await.unwrap().unwrap();
    assert_eq!(record.sync_status, SyncStatus::Failed);
    assert_eq!(record.remote_id, None);

    let logs = h.store.all_logs().await;
    assert_eq!(logs[0].status, LogStatus::Failed);
    assert!(logs[0].error_message.as_deref().unwrap().contains("HTTP 500"));

    // A later successful push recovers the record.
    h.remote.recover("create");
    let tracked = h.engine.movies().sync_to_remote(id).await.unwrap();
    assert_eq!(tracked.sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn remote_id_claimed_by_another_record_is_a_conflict() {
    let h = Harness::new();
    let first = h.add_movie(&samurai_cop()).await;
    let taken = h
        .engine
        .movies()
        .sync_to_remote(first)
        .await
        .unwrap()
        .remote_id
        .unwrap();

    let second = h.add_movie(&Movie::new("Miami Connection")).await;
    h.remote.hand_out_id(taken.value());

    let err = h.engine.movies().sync_to_remote(second).await.unwrap_err();
    assert!(matches!(err, SyncError::Conflict { local_id, .. } if local_id == second));

    let loser = h.store.fetch(EntityKind::Movie, second).await.unwrap().unwrap();
    assert_eq!(loser.sync_status, SyncStatus::Conflict);
    assert_eq!(loser.remote_id, None);

    let winner = h.store.fetch(EntityKind::Movie, first).await.unwrap().unwrap();
    assert_eq!(winner.remote_id, Some(taken));
    assert_eq!(winner.sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn pull_materializes_unknown_post() {
    let h = Harness::new();
    h.remote
        .insert(EntityKind::Movie, 42, movie_post("Miami Connection", "1987"));

    let tracked = h
        .engine
        .movies()
        .sync_from_remote(RemoteId::new(42))
        .await
        .unwrap();

    assert_eq!(tracked.remote_id, Some(RemoteId::new(42)));
    assert_eq!(tracked.sync_status, SyncStatus::Synced);
    assert_eq!(tracked.entity.title, "Miami Connection");
    assert_eq!(tracked.entity.release_year.as_deref(), Some("1987"));
    assert_eq!(tracked.entity.genres, vec!["Action".to_string()]);
    assert_eq!(tracked.remote_snapshot.unwrap()["id"], 42);

    let logs = h.store.all_logs().await;
    assert_eq!(logs[0].direction, SyncDirection::FromRemote);
    assert_eq!(logs[0].local_id, Some(tracked.local_id));
}

#[tokio::test]
async fn pull_merges_into_record_with_same_remote_id() {
    let h = Harness::new();
    let local = Movie {
        overview: Some("Kept locally".to_string()),
        ..Movie::new("Miami Connection")
    };
    let id = h.add_movie(&local).await;
    let remote_id = h
        .engine
        .movies()
        .sync_to_remote(id)
        .await
        .unwrap()
        .remote_id
        .unwrap();

    let post = movie_post("Miami Connection (1987)", "1987");
    h.remote.insert(EntityKind::Movie, remote_id.value(), post);

    let tracked = h.engine.movies().sync_from_remote(remote_id).await.unwrap();

    assert_eq!(tracked.local_id, id);
    assert_eq!(tracked.entity.title, "Miami Connection (1987)");
    assert_eq!(tracked.entity.release_year.as_deref(), Some("1987"));
    // The post does not carry an overview, so the local one stays.
    assert_eq!(tracked.entity.overview.as_deref(), Some("Kept locally"));

    let all = h.store.list_records(EntityKind::Movie, None).await.unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn pull_clears_fields_emptied_on_the_remote() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;
    let remote_id = h
        .engine
        .movies()
        .sync_to_remote(id)
        .await
        .unwrap()
        .remote_id
        .unwrap();

    h.remote
        .set_meta(EntityKind::Movie, remote_id.value(), "movie_actors", json!([]));
    h.remote
        .set_meta(EntityKind::Movie, remote_id.value(), "movie_imdb_id", json!(""));

    let tracked = h.engine.movies().sync_from_remote(remote_id).await.unwrap();

    assert!(tracked.entity.movie_actors.is_empty());
    assert_eq!(tracked.entity.imdb_id, None);
    assert_eq!(tracked.entity.genres, vec!["Action", "Crime"]);

    let stored = h.store.fetch(EntityKind::Movie, id).await.unwrap().unwrap();
    assert_eq!(stored.entity["movie_actors"], json!([]));
}

#[tokio::test]
async fn pull_never_matches_by_title() {
    let h = Harness::new();
    let id = h.add_movie(&Movie::new("Miami Connection")).await;
    h.remote
        .insert(EntityKind::Movie, 7, movie_post("Miami Connection", "1987"));

    let tracked = h
        .engine
        .movies()
        .sync_from_remote(RemoteId::new(7))
        .await
        .unwrap();

    assert_ne!(tracked.local_id, id);
    let untouched = h.store.fetch(EntityKind::Movie, id).await.unwrap().unwrap();
    assert_eq!(untouched.remote_id, None);
    assert_eq!(untouched.sync_status, SyncStatus::Unsynced);
}

#[tokio::test]
async fn pull_of_missing_post_is_not_found() {
    let h = Harness::new();

    let err = h
        .engine
        .sync_from_remote(EntityKind::Actor, RemoteId::new(9))
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::NotFoundRemote { .. }));

    let logs = h.store.all_logs().await;
    assert_eq!(logs[0].status, LogStatus::Failed);
    assert_eq!(logs[0].remote_id, Some(RemoteId::new(9)));
    assert_eq!(logs[0].local_id, None);
}

#[tokio::test]
async fn pull_of_deleted_linked_post_fails_the_local_record() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;
    let remote_id = h
        .engine
        .movies()
        .sync_to_remote(id)
        .await
        .unwrap()
        .remote_id
        .unwrap();
    h.remote.remove(EntityKind::Movie, remote_id.value());

    let err = h.engine.movies().sync_from_remote(remote_id).await.unwrap_err();
    assert!(matches!(err, SyncError::NotFoundRemote { .. }));

    let record = h.store.fetch(EntityKind::Movie, id).await.unwrap().unwrap();
    assert_eq!(record.sync_status, SyncStatus::Failed);
    assert_eq!(record.remote_id, Some(remote_id));

    let last = h.store.all_logs().await.pop().unwrap();
    assert_eq!(last.direction, SyncDirection::FromRemote);
    assert_eq!(last.status, LogStatus::Failed);
    assert_eq!(last.local_id, Some(id));
    assert_eq!(last.remote_id, Some(remote_id));
}

#[tokio::test]
async fn pull_rejects_malformed_field() {
    let h = Harness::new();
    let mut post = movie_post("Samurai Cop", "1991");
    post["meta"]["movie_runtime"] = json!("ninety minutes");
    h.remote.insert(EntityKind::Movie, 5, post);

    let err = h
        .engine
        .sync_from_remote(EntityKind::Movie, RemoteId::new(5))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Transcode(_)));
    assert!(err.to_string().contains("runtime_minutes"));
    assert!(
        h.store
            .list_records(EntityKind::Movie, None)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn samurai_cop_push_links_remote_id_501() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;
    h.remote.hand_out_id(501);

    let tracked = h.engine.movies().sync_to_remote(id).await.unwrap();

    assert_eq!(tracked.remote_id, Some(RemoteId::new(501)));
    assert_eq!(tracked.sync_status, SyncStatus::Synced);
    assert_eq!(tracked.remote_snapshot.unwrap()["id"], 501);

    let stored = h.store.fetch(EntityKind::Movie, id).await.unwrap().unwrap();
    assert_eq!(stored.remote_id, Some(RemoteId::new(501)));
    assert_eq!(stored.sync_status, SyncStatus::Synced);
    assert_eq!(
        h.store
            .fetch_by_remote_id(EntityKind::Movie, RemoteId::new(501))
            .await
            .unwrap()
            .map(|r| r.local_id),
        Some(id)
    );
}

#[tokio::test]
async fn bidirectional_writes_three_log_entries() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;
    // The CMS maintains the director list itself.
    h.remote
        .compute_meta(EntityKind::Movie, "movie_directors", json!(["Amir Shervan"]));

    let tracked = h.engine.movies().bidirectional_sync(id).await.unwrap();
    assert_eq!(tracked.sync_status, SyncStatus::Synced);
    assert_eq!(tracked.entity.movie_actors.len(), 2);
    assert_eq!(tracked.entity.movie_directors, vec!["Amir Shervan"]);

    let stored = h.store.fetch(EntityKind::Movie, id).await.unwrap().unwrap();
    assert_eq!(stored.entity["movie_directors"], json!(["Amir Shervan"]));

    let directions: Vec<_> = h
        .store
        .all_logs()
        .await
        .into_iter()
        .map(|e| (e.direction, e.status))
        .collect();
    assert_eq!(
        directions,
        vec![
            (SyncDirection::ToRemote, LogStatus::Success),
            (SyncDirection::FromRemote, LogStatus::Success),
            (SyncDirection::Bidirectional, LogStatus::Success),
        ]
    );
}

#[tokio::test]
async fn bidirectional_skips_pull_when_push_fails() {
    let h = Harness::new();
    let id = h.add_movie(&samurai_cop()).await;
    h.remote.fail("create");

    let err = h.engine.movies().bidirectional_sync(id).await.unwrap_err();
    assert!(matches!(err, SyncError::Transport(_)));
    assert!(!h.remote.calls().iter().any(|c| c.starts_with("get")));

    let logs = h.store.all_logs().await;
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].direction, SyncDirection::Bidirectional);
    assert_eq!(logs[1].status, LogStatus::Failed);
}

async fn add_experiment(h: &Harness, movies: Vec<i64>) -> LocalId {
    let experiment = Experiment {
        title: "Experiment 12".to_string(),
        movies,
        ..Experiment::default()
    };
    h.store
        .create(NewRecord::unsynced(
            EntityKind::Experiment,
            serde_json::to_value(&experiment).unwrap(),
        ))
        .await
        .unwrap()
        .local_id
}

#[tokio::test]
async fn inverse_mismatch_is_a_conflict_when_verification_is_on() {
    let h = Harness::with_options(SyncOptions {
        verify_inverse_relationships: true,
        ..SyncOptions::default()
    });
    h.remote
        .insert(EntityKind::Movie, 10, movie_post("Samurai Cop", "1991"));
    let id = add_experiment(&h, vec![10]).await;

    let err = h.engine.experiments().bidirectional_sync(id).await.unwrap_err();
    assert!(matches!(err, SyncError::Conflict { .. }));
    assert!(err.to_string().contains("related_experiments"));

    let record = h
        .store
        .fetch(EntityKind::Experiment, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.sync_status, SyncStatus::Conflict);

    let last = h.store.all_logs().await.pop().unwrap();
    assert_eq!(last.direction, SyncDirection::Bidirectional);
    assert_eq!(last.status, LogStatus::Failed);
}

#[tokio::test]
async fn inverse_pointing_back_passes_verification() {
    let h = Harness::with_options(SyncOptions {
        verify_inverse_relationships: true,
        ..SyncOptions::default()
    });
    // The fake hands out 100 to the first created post.
    let mut movie = movie_post("Samurai Cop", "1991");
    movie["meta"]["related_experiments"] = json!([{ "ID": 100, "post_title": "Experiment 12" }]);
    h.remote.insert(EntityKind::Movie, 10, movie);
    let id = add_experiment(&h, vec![10]).await;

    let tracked = h.engine.experiments().bidirectional_sync(id).await.unwrap();

    assert_eq!(tracked.remote_id, Some(RemoteId::new(100)));
    assert_eq!(tracked.entity.movies, vec![10]);
    assert_eq!(tracked.sync_status, SyncStatus::Synced);
}

#[tokio::test]
async fn inverse_is_not_checked_by_default() {
    let h = Harness::new();
    h.remote
        .insert(EntityKind::Movie, 10, movie_post("Samurai Cop", "1991"));
    let id = add_experiment(&h, vec![10]).await;

    h.engine.experiments().bidirectional_sync(id).await.unwrap();
    assert!(!h.remote.calls().contains(&"get movie 10".to_string()));
}
