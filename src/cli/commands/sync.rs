use crate::cli::SyncCommands;
use crate::config::Config;
use crate::domain::{LocalId, RemoteId};
use crate::models::StoredRecord;
use crate::services::BulkSyncReport;
use crate::state::SharedState;

pub async fn cmd_sync(config: Config, command: SyncCommands) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let engine = &state.engine;

    match command {
        SyncCommands::Push { kind, id } => {
            let record = engine.sync_to_remote(kind, LocalId::new(id)).await?;
            print_record("Pushed", &record);
        }
        SyncCommands::Pull { kind, remote_id } => {
            let record = engine
                .sync_from_remote(kind, RemoteId::new(remote_id))
                .await?;
            print_record("Pulled", &record);
        }
        SyncCommands::Both { kind, id } => {
            let record = engine.bidirectional_sync(kind, LocalId::new(id)).await?;
            print_record("Synced", &record);
        }
        SyncCommands::BulkPull { kind } => {
            let report = engine.bulk_sync_from_remote(kind).await;
            print_report(&report);
        }
        SyncCommands::BulkPush { kind } => {
            let report = engine.bulk_sync_to_remote(kind).await?;
            print_report(&report);
        }
    }

    Ok(())
}

fn print_record(action: &str, record: &StoredRecord) {
    let remote = record
        .remote_id
        .map_or_else(|| "-".to_string(), |id| id.to_string());
    println!(
        "✓ {} {} {} (remote {}) - {}",
        action, record.kind, record.local_id, remote, record.sync_status
    );
}

fn print_report(report: &BulkSyncReport) {
    println!("Bulk {} of {} ({})", report.direction, report.kind, report.run_id);
    println!("{:-<70}", "");
    println!(
        "Processed: {} | Succeeded: {} | Failed: {}",
        report.processed,
        report.succeeded,
        report.failed_count()
    );
    if report.pages > 0 {
        println!("Pages: {}", report.pages);
    }

    for failure in &report.failed {
        let local = failure
            .local_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        let remote = failure
            .remote_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        println!("  ✗ local={} remote={}: {}", local, remote, failure.message);
    }

    if let (Some(page), Some(reason)) = (report.interrupted_at_page, &report.interruption) {
        println!();
        println!("⚠ Stopped at page {page}: {reason}");
    }
}
