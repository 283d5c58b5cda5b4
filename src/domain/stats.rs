//! Click aggregation over date windows.
//!
//! [`summarize`] is a pure function over an already-loaded click log: the
//! same events, window and clock always produce the same [`StatsSummary`].

use crate::domain::entities::ClickEvent;
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};

/// Maximum number of events returned in [`StatsSummary::recent_clicks`].
pub const RECENT_CLICKS_LIMIT: usize = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive time window applied to click events.
///
/// Both bounds absent means "every event". With only `start`, the upper bound
/// is the current time; with only `end`, the lower bound is the Unix epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl StatsWindow {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// A window that includes every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Parses user-supplied bounds.
    ///
    /// Each bound is either an RFC 3339 timestamp or a calendar date
    /// (`YYYY-MM-DD`, UTC). A calendar `start` begins at midnight; a calendar
    /// `end` covers the whole day, up to `23:59:59.999`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if a bound matches neither format.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, AppError> {
        let start = start
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, BoundKind::Start))
            .transpose()?;
        let end = end
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_bound(s, BoundKind::End))
            .transpose()?;

        Ok(Self { start, end })
    }

    /// Concrete bounds at `now`, or `None` when the window is unbounded.
    pub fn bounds(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.start, self.end) {
            (None, None) => None,
            (start, end) => Some((
                start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
                end.unwrap_or(now),
            )),
        }
    }
}

#[derive(Clone, Copy)]
enum BoundKind {
    Start,
    End,
}

fn parse_bound(raw: &str, kind: BoundKind) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        AppError::bad_request(
            "Invalid date, expected YYYY-MM-DD or RFC 3339",
            json!({ "value": raw }),
        )
    })?;

    let time = match kind {
        BoundKind::Start => date.and_hms_milli_opt(0, 0, 0, 0),
        BoundKind::End => date.and_hms_milli_opt(23, 59, 59, 999),
    };

    time.map(|t| t.and_utc())
        .ok_or_else(|| AppError::bad_request("Invalid date", json!({ "value": raw })))
}

/// Aggregated view of a link's clicks within a window.
///
/// Maps are ordered so that serialising the same summary twice yields
/// identical bytes. Categories never observed are absent rather than zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub total_clicks: u64,
    pub unique_visitors: u64,
    pub device_types: BTreeMap<String, u64>,
    pub browsers: BTreeMap<String, u64>,
    pub operating_systems: BTreeMap<String, u64>,
    pub countries: BTreeMap<String, u64>,
    pub clicks_by_date: BTreeMap<String, u64>,
    /// Up to [`RECENT_CLICKS_LIMIT`] events, most recent first.
    pub recent_clicks: Vec<ClickEvent>,
}

/// Computes the summary of `events` (in arrival order) restricted to `window`.
pub fn summarize(events: &[ClickEvent], window: &StatsWindow, now: DateTime<Utc>) -> StatsSummary {
    let filtered: Vec<&ClickEvent> = match window.bounds(now) {
        None => events.iter().collect(),
        Some((start, end)) => events
            .iter()
            .filter(|e| start <= e.timestamp && e.timestamp <= end)
            .collect(),
    };

    let mut device_types = BTreeMap::new();
    let mut browsers = BTreeMap::new();
    let mut operating_systems = BTreeMap::new();
    let mut countries = BTreeMap::new();
    let mut clicks_by_date = BTreeMap::new();
    let mut visitors = HashSet::new();

    for event in &filtered {
        visitors.insert(event.ip.as_str());
        bump(&mut device_types, event.device_type.as_str());
        bump(&mut browsers, &event.browser);
        bump(&mut operating_systems, &event.os);
        bump(&mut countries, &event.country);
        bump(
            &mut clicks_by_date,
            &event.timestamp.date_naive().format(DATE_FORMAT).to_string(),
        );
    }

    let recent_clicks = filtered
        .iter()
        .rev()
        .take(RECENT_CLICKS_LIMIT)
        .map(|e| (*e).clone())
        .collect();

    StatsSummary {
        total_clicks: filtered.len() as u64,
        unique_visitors: visitors.len() as u64,
        device_types,
        browsers,
        operating_systems,
        countries,
        clicks_by_date,
        recent_clicks,
    }
}

fn bump(counts: &mut BTreeMap<String, u64>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}
