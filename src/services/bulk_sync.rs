//! Sequential bulk runs over a whole entity type.
//!
//! Items are processed one at a time. A failing item is recorded in the
//! report (its log entry is written by the engine) and the run moves on; only
//! a failed page fetch ends a pull early.

use super::sync_service::{SyncEngine, SyncError};
use crate::domain::{EntityKind, LocalId, LogStatus, RemoteId, SyncDirection, SyncStatus};
use crate::models::NewSyncLogEntry;
use crate::transcode::remote_id_of;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub local_id: Option<LocalId>,
    pub remote_id: Option<RemoteId>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkSyncReport {
    pub run_id: String,
    pub kind: EntityKind,
    pub direction: SyncDirection,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: Vec<BulkFailure>,
    /// Listing pages fetched; always 0 for pushes.
    pub pages: u32,
    /// Page whose fetch failed and ended the run.
    pub interrupted_at_page: Option<u32>,
    pub interruption: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BulkSyncReport {
    fn start(kind: EntityKind, direction: SyncDirection) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4().to_string(),
            kind,
            direction,
            processed: 0,
            succeeded: 0,
            failed: Vec::new(),
            pages: 0,
            interrupted_at_page: None,
            interruption: None,
            started_at: now,
            finished_at: now,
        }
    }

    fn record(&mut self, local_id: Option<LocalId>, remote_id: Option<RemoteId>, result: Result<(), String>) {
        self.processed += 1;
        match result {
            Ok(()) => self.succeeded += 1,
            Err(message) => self.failed.push(BulkFailure {
                local_id,
                remote_id,
                message,
            }),
        }
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.interrupted_at_page.is_none()
    }
}

impl SyncEngine {
    /// Pulls every post of `kind`, page by page, until the last page.
    pub async fn bulk_sync_from_remote(&self, kind: EntityKind) -> BulkSyncReport {
        let mut report = BulkSyncReport::start(kind, SyncDirection::FromRemote);
        let span = info_span!("bulk_pull", run_id = %report.run_id, %kind);

        async {
            let syncer = self.for_kind(kind);
            let per_page = self.options.page_size.max(1);
            let mut page = 1;

            loop {
                let listing = match self.remote.list_page(kind, page, per_page).await {
                    Ok(listing) => listing,
                    Err(e) => {
                        warn!(page, error = %e, "Listing failed, ending run");
                        report.interrupted_at_page = Some(page);
                        report.interruption = Some(e.to_string());
                        break;
                    }
                };
                report.pages += 1;

                if listing.items.is_empty() {
                    break;
                }

                for item in &listing.items {
                    let remote_id = match remote_id_of(item) {
                        Ok(id) => id,
                        Err(e) => {
                            let message = format!("listing item on page {page}: {e}");
                            self.log_unidentified(kind, &message).await;
                            report.record(None, None, Err(message));
                            continue;
                        }
                    };

                    let result = syncer.pull(remote_id).await;
                    let local_id = result.as_ref().ok().map(|r| r.local_id);
                    report.record(local_id, Some(remote_id), result.map(|_| ()).map_err(|e| e.to_string()));
                }

                if listing.is_last_page {
                    break;
                }
                page += 1;
            }

            report.finished_at = Utc::now();
            info!(
                processed = report.processed,
                succeeded = report.succeeded,
                failed = report.failed_count(),
                pages = report.pages,
                "Bulk pull finished"
            );
        }
        .instrument(span)
        .await;

        report
    }

    /// Pushes every local record of `kind` that is not already synced.
    pub async fn bulk_sync_to_remote(&self, kind: EntityKind) -> Result<BulkSyncReport, SyncError> {
        let mut report = BulkSyncReport::start(kind, SyncDirection::ToRemote);
        let span = info_span!("bulk_push", run_id = %report.run_id, %kind);

        async {
            let pending: Vec<_> = self
                .store
                .list_records(kind, None)
                .await?
                .into_iter()
                .filter(|r| r.sync_status != SyncStatus::Synced)
                .collect();
            info!(pending = pending.len(), "Starting bulk push");

            let syncer = self.for_kind(kind);
            for record in pending {
                let result = syncer.push(record.local_id).await;
                let remote_id = result.as_ref().ok().and_then(|r| r.remote_id).or(record.remote_id);
                report.record(
                    Some(record.local_id),
                    remote_id,
                    result.map(|_| ()).map_err(|e| e.to_string()),
                );
            }

            report.finished_at = Utc::now();
            info!(
                processed = report.processed,
                succeeded = report.succeeded,
                failed = report.failed_count(),
                "Bulk push finished"
            );
            Ok::<_, SyncError>(())
        }
        .instrument(span)
        .await?;

        Ok(report)
    }

    /// A listing item without an id never reaches the engine, so log it here.
    async fn log_unidentified(&self, kind: EntityKind, message: &str) {
        let entry = NewSyncLogEntry {
            entity_type: kind,
            local_id: None,
            remote_id: None,
            direction: SyncDirection::FromRemote,
            status: LogStatus::Failed,
            error_message: Some(message.to_string()),
            completed_at: Utc::now(),
        };
        if let Err(e) = self.store.append_log(entry).await {
            warn!(error = %e, "Could not write sync log entry");
        }
        metrics::counter!(
            "sync_attempts_total",
            "entity_type" => kind.as_str(),
            "direction" => SyncDirection::FromRemote.as_str(),
            "status" => LogStatus::Failed.as_str()
        )
        .increment(1);
    }
}
