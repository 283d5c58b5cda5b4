//! Queue message for asynchronous click recording.

use crate::domain::entities::ClickEvent;

/// A click waiting to be appended to a record's log.
///
/// Built by the redirect path once a code has resolved and pushed onto a
/// bounded channel, so the visitor's response never waits for the write.
/// Consumed by [`crate::domain::click_worker::run_click_worker`].
#[derive(Debug, Clone)]
pub struct PendingClick {
    pub record_id: i64,
    pub event: ClickEvent,
}

impl PendingClick {
    pub fn new(record_id: i64, event: ClickEvent) -> Self {
        Self { record_id, event }
    }
}
