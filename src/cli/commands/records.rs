//! Local record listing and creation

use anyhow::Context;

use crate::config::Config;
use crate::db::{RecordStore, Store};
use crate::domain::{EntityKind, SyncStatus};
use crate::models::{Movie, NewRecord};

pub async fn cmd_list_records(
    config: &Config,
    kind: EntityKind,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let status = status
        .map(str::parse::<SyncStatus>)
        .transpose()
        .context("Invalid --status")?;

    let store = Store::new(&config.general.database_path).await?;
    let records = store.list_records(kind, status).await?;

    if records.is_empty() {
        println!("No {kind} records.");
        println!();
        println!("Pull them with: marquee sync bulk-pull {kind}");
        return Ok(());
    }

    println!("{} records ({} total)", kind, records.len());
    println!("{:-<70}", "");

    for record in records {
        let title = record
            .entity
            .get("title")
            .or_else(|| record.entity.get("name"))
            .and_then(|v| v.as_str())
            .unwrap_or("(untitled)");
        let remote = record
            .remote_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let synced = record
            .last_synced_at
            .map_or_else(|| "never".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());

        println!("• [{}] {}", record.local_id, title);
        println!(
            "  Remote: {} | Status: {} | Last synced: {}",
            remote, record.sync_status, synced
        );
    }

    Ok(())
}

pub async fn cmd_add_movie(
    config: &Config,
    title: &str,
    year: Option<String>,
    tmdb_id: Option<i64>,
    imdb_id: Option<String>,
    genres: Vec<String>,
) -> anyhow::Result<()> {
    let title = title.trim();
    if title.is_empty() {
        anyhow::bail!("Title must not be empty");
    }

    let movie = Movie {
        release_year: year,
        tmdb_id,
        imdb_id,
        genres,
        ..Movie::new(title)
    };
    let data = serde_json::to_value(&movie)?;

    let store = Store::new(&config.general.database_path).await?;
    let record = store
        .create(NewRecord::unsynced(EntityKind::Movie, data))
        .await?;

    println!("✓ Added movie '{}' with local id {}", title, record.local_id);
    println!("  Push it with: marquee sync push movie {}", record.local_id);

    Ok(())
}
