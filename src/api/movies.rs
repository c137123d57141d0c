use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::models::EnrichedMovie;

/// `GET /api/movies/{tmdb_id}/details`
pub async fn details(
    State(state): State<Arc<AppState>>,
    Path(tmdb_id): Path<i64>,
) -> Result<Json<ApiResponse<EnrichedMovie>>, ApiError> {
    if tmdb_id <= 0 {
        return Err(ApiError::validation("TMDB id must be positive"));
    }
    let movie = state.enrichment().movie_details(tmdb_id).await?;
    Ok(Json(ApiResponse::success(movie)))
}
