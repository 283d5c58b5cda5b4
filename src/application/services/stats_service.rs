//! Click recording and statistics.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use super::ownership::find_owned;
use crate::domain::entities::{ClickContext, ClickEvent, LinkRecord, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::domain::stats::{StatsSummary, StatsWindow, summarize};
use crate::error::AppError;

/// A link together with the summary of its clicks.
#[derive(Debug, Clone)]
pub struct LinkStats {
    pub record: LinkRecord,
    pub summary: StatsSummary,
}

/// Records clicks and computes per-link statistics.
pub struct StatsService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
}

impl<L: LinkRepository + ?Sized> StatsService<L> {
    pub fn new(repository: Arc<L>) -> Self {
        Self { repository }
    }

    /// Appends a click and bumps the counter in one store operation.
    ///
    /// Returns the new click count. Used by the background click worker.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link no longer exists.
    /// Returns [`AppError::StorageUnavailable`] on transient storage failures.
    pub async fn record_click(&self, record_id: i64, event: ClickEvent) -> Result<i64, AppError> {
        self.repository.record_click(record_id, event).await
    }

    /// Records a click reported directly by a client rather than by a redirect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist and
    /// [`AppError::Disabled`] if it has been disabled.
    pub async fn track_click(
        &self,
        record_id: i64,
        context: ClickContext,
    ) -> Result<i64, AppError> {
        let record = self
            .repository
            .find_by_id(record_id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": record_id })))?;

        if !record.is_active {
            return Err(AppError::disabled(
                "Link is disabled",
                json!({ "id": record_id }),
            ));
        }

        self.record_click(record_id, ClickEvent::new(Utc::now(), context))
            .await
    }

    /// Summarizes the clicks of one of the owner's links within `window`.
    ///
    /// The record and its click log are read once each; the returned
    /// `click_count` is taken from that same log.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`].
    pub async fn get_stats(
        &self,
        record_id: i64,
        owner_id: &OwnerId,
        window: &StatsWindow,
    ) -> Result<LinkStats, AppError> {
        let mut record = find_owned(self.repository.as_ref(), record_id, owner_id).await?;

        let events = self.repository.find_clicks(record_id).await?;
        record.click_count = events.len() as i64;

        Ok(LinkStats {
            summary: summarize(&events, window, Utc::now()),
            record,
        })
    }
}
