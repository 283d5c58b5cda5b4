//! DTOs for link statistics.

use serde::{Deserialize, Serialize};

use crate::domain::stats::StatsSummary;

/// Query parameters for `GET /api/links/{id}/stats`.
///
/// Both bounds accept `YYYY-MM-DD` or RFC 3339. A date-only `end_date`
/// covers that whole day.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Click summary for one link.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub id: i64,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub click_count: i64,
    #[serde(flatten)]
    pub summary: StatsSummary,
}
