//! Repository trait for link records and their click log.

use crate::domain::entities::{ClickEvent, LinkPatch, LinkRecord, NewLinkRecord, OwnerId};
use crate::error::AppError;
use async_trait::async_trait;

/// Storage interface for link records.
///
/// Short codes and custom slugs form one namespace. Implementations enforce
/// its uniqueness inside the same atomic step that writes the record, so a
/// losing concurrent writer always observes [`AppError::Conflict`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::InMemoryLinkRepository`] - process-local store
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new record with `click_count = 0` and `is_active = true`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code or slug is already
    /// held by any record, as either a short code or a slug.
    /// Returns [`AppError::StorageUnavailable`] on transient storage failures.
    async fn insert(&self, new_link: NewLinkRecord) -> Result<LinkRecord, AppError>;

    /// Finds the record whose short code or slug equals `code`.
    ///
    /// At most one record can match.
    async fn find_by_code(&self, code: &str) -> Result<Option<LinkRecord>, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<LinkRecord>, AppError>;

    /// Returns the record only if it exists and belongs to `owner_id`.
    async fn find_by_owner_and_id(
        &self,
        owner_id: &OwnerId,
        id: i64,
    ) -> Result<Option<LinkRecord>, AppError>;

    /// Lists an owner's records, newest first.
    ///
    /// `search` is a case-insensitive substring filter over the destination,
    /// short code and slug.
    async fn list_by_owner(
        &self,
        owner_id: &OwnerId,
        offset: i64,
        limit: i64,
        search: Option<String>,
    ) -> Result<Vec<LinkRecord>, AppError>;

    async fn count_by_owner(
        &self,
        owner_id: &OwnerId,
        search: Option<String>,
    ) -> Result<i64, AppError>;

    /// Applies a partial update of the owner-mutable fields.
    ///
    /// A slug change re-checks the namespace atomically with the write;
    /// clearing the slug frees it in the same step.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record does not exist.
    /// Returns [`AppError::Conflict`] if the new slug is taken.
    async fn update(&self, id: i64, patch: LinkPatch) -> Result<LinkRecord, AppError>;

    /// Permanently removes a record, its codes and its clicks.
    ///
    /// Returns `Ok(false)` if no such record exists.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Appends `event` and increments `click_count` as one atomic mutation.
    ///
    /// Returns the new click count.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the record was deleted meanwhile.
    /// Returns [`AppError::StorageUnavailable`] on transient storage failures.
    async fn record_click(&self, id: i64, event: ClickEvent) -> Result<i64, AppError>;

    /// Returns the record's click events in arrival order.
    async fn find_clicks(&self, id: i64) -> Result<Vec<ClickEvent>, AppError>;

    /// Cheap connectivity probe used by the health endpoint.
    async fn ping(&self) -> Result<(), AppError>;
}
