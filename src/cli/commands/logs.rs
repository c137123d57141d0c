use anyhow::Context;

use crate::config::Config;
use crate::db::{LogQuery, RecordStore, Store};
use crate::domain::{EntityKind, LogStatus};

pub async fn cmd_logs(
    config: &Config,
    page: u64,
    page_size: u64,
    entity_type: Option<EntityKind>,
    status: Option<&str>,
) -> anyhow::Result<()> {
    let status = status
        .map(str::parse::<LogStatus>)
        .transpose()
        .context("Invalid --status")?;

    let store = Store::new(&config.general.database_path).await?;
    let result = store
        .recent_logs(&LogQuery {
            page,
            page_size,
            entity_type,
            status,
        })
        .await?;

    if result.entries.is_empty() {
        println!("No sync log entries.");
        return Ok(());
    }

    println!("Sync log (page {} of {}):", page.max(1), result.total_pages);
    println!("{:-<70}", "");

    for entry in result.entries {
        let marker = match entry.status {
            LogStatus::Success => "✓",
            LogStatus::Failed => "✗",
        };
        let local = entry
            .local_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let remote = entry
            .remote_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());

        println!(
            "{} {} {} local={} remote={} at {}",
            marker,
            entry.entity_type,
            entry.direction,
            local,
            remote,
            entry.completed_at.format("%Y-%m-%d %H:%M:%S")
        );
        if let Some(error) = entry.error_message {
            println!("  {error}");
        }
    }

    Ok(())
}
