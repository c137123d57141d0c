use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LogResponse, RecordDto};
use crate::constants::limits::DEFAULT_LOG_PAGE_SIZE;
use crate::db::LogQuery;
use crate::domain::{EntityKind, LocalId, LogStatus, RemoteId};
use crate::services::BulkSyncReport;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub entity_type: Option<String>,
    pub status: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_page_size() -> u64 {
    DEFAULT_LOG_PAGE_SIZE
}

impl LogsQuery {
    fn into_log_query(self) -> Result<LogQuery, ApiError> {
        let entity_type = self
            .entity_type
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<EntityKind>())
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?;
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<LogStatus>())
            .transpose()
            .map_err(|e| ApiError::validation(e.to_string()))?;

        Ok(LogQuery {
            page: self.page,
            page_size: self.page_size,
            entity_type,
            status,
        })
    }
}

fn parse_kind(kind: &str) -> Result<EntityKind, ApiError> {
    kind.parse().map_err(|e: crate::domain::ParseEnumError| ApiError::validation(e.to_string()))
}

/// `GET /api/sync/logs`
pub async fn list_logs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LogsQuery>,
) -> Result<Json<ApiResponse<LogResponse>>, ApiError> {
    let query = params.into_log_query()?;
    let page = state.store().recent_logs(&query).await?;

    Ok(Json(ApiResponse::success(LogResponse {
        logs: page.entries,
        total_pages: page.total_pages,
    })))
}

/// `POST /api/sync/{kind}/{id}/push`
pub async fn push(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<RecordDto>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let record = state.engine().sync_to_remote(kind, LocalId::new(id)).await?;
    Ok(Json(ApiResponse::success(record.into())))
}

/// `POST /api/sync/{kind}/{id}/bidirectional`
pub async fn bidirectional(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<RecordDto>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let record = state
        .engine()
        .bidirectional_sync(kind, LocalId::new(id))
        .await?;
    Ok(Json(ApiResponse::success(record.into())))
}

/// `POST /api/sync/{kind}/remote/{remote_id}/pull`
pub async fn pull(
    State(state): State<Arc<AppState>>,
    Path((kind, remote_id)): Path<(String, i64)>,
) -> Result<Json<ApiResponse<RecordDto>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let record = state
        .engine()
        .sync_from_remote(kind, RemoteId::new(remote_id))
        .await?;
    Ok(Json(ApiResponse::success(record.into())))
}

/// `POST /api/sync/{kind}/bulk-pull`
///
/// Runs to completion before answering; the report carries per-item failures.
pub async fn bulk_pull(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<ApiResponse<BulkSyncReport>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let report = state.engine().bulk_sync_from_remote(kind).await;
    Ok(Json(ApiResponse::success(report)))
}
