//! Handler for per-link click statistics.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use crate::api::dto::stats::{StatsQuery, StatsResponse};
use crate::application::services::LinkStats;
use crate::domain::entities::OwnerId;
use crate::domain::stats::StatsWindow;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the click summary of one of the owner's links.
///
/// # Endpoint
///
/// `GET /api/links/{id}/stats`
///
/// # Query Parameters
///
/// - `start_date` (optional): lower bound, `YYYY-MM-DD` or RFC 3339; defaults to the epoch
/// - `end_date` (optional): upper bound; a bare date covers the whole day; defaults to now
///
/// Without either bound every click is included.
///
/// # Errors
///
/// - 400 if a date cannot be parsed
/// - 403 if the link belongs to another owner
/// - 404 if the link does not exist
pub async fn stats_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<i64>,
    Query(params): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let window = StatsWindow::parse(params.start_date.as_deref(), params.end_date.as_deref())?;

    let LinkStats { record, summary } = state
        .stats_service
        .get_stats(id, &owner, &window)
        .await?;

    Ok(Json(StatsResponse {
        id: record.id,
        short_url: state.link_service.short_url(&record),
        short_code: record.short_code,
        original_url: record.original_url,
        click_count: record.click_count,
        summary,
    }))
}
