//! Short code allocation with bounded retries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::entities::{LinkRecord, NewLinkRecord, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::generate_code;

/// Attempts shared by probing and inserting before allocation gives up.
pub const MAX_ALLOCATION_ATTEMPTS: usize = 10;

/// Everything needed to insert a link except its short code.
#[derive(Debug, Clone)]
pub struct LinkDraft {
    pub original_url: String,
    pub custom_slug: Option<String>,
    pub owner_id: OwnerId,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkDraft {
    fn with_code(&self, short_code: String) -> NewLinkRecord {
        NewLinkRecord {
            original_url: self.original_url.clone(),
            short_code,
            custom_slug: self.custom_slug.clone(),
            owner_id: self.owner_id.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Draws short codes that are free in the shared code/slug namespace.
///
/// The probe only avoids wasted inserts. The store's atomic uniqueness check
/// on insert is what actually settles a race between two allocators.
pub struct CodeAllocator<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
}

impl<L: LinkRepository + ?Sized> CodeAllocator<L> {
    pub fn new(repository: Arc<L>) -> Self {
        Self { repository }
    }

    /// Returns a code that was free when probed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AllocationExhausted`] after
    /// [`MAX_ALLOCATION_ATTEMPTS`] consecutive collisions.
    pub async fn allocate_code(&self) -> Result<String, AppError> {
        let mut remaining = MAX_ALLOCATION_ATTEMPTS;
        self.probe(&mut remaining).await
    }

    /// Allocates a code and inserts `draft` under it.
    ///
    /// A [`AppError::Conflict`] from the store means either the fresh code was
    /// claimed after it was probed, or the draft's slug was. The slug is
    /// re-probed to tell the two apart: a taken slug is returned to the
    /// caller, a lost code race costs one attempt and a new code is drawn.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the custom slug is taken.
    /// Returns [`AppError::AllocationExhausted`] when probes and lost races
    /// together use up [`MAX_ALLOCATION_ATTEMPTS`].
    pub async fn insert_with_fresh_code(&self, draft: &LinkDraft) -> Result<LinkRecord, AppError> {
        let mut remaining = MAX_ALLOCATION_ATTEMPTS;

        loop {
            let code = self.probe(&mut remaining).await?;

            match self.repository.insert(draft.with_code(code.clone())).await {
                Ok(record) => return Ok(record),
                Err(AppError::Conflict { .. }) => {
                    if let Some(slug) = &draft.custom_slug
                        && self.repository.find_by_code(slug).await?.is_some()
                    {
                        return Err(AppError::conflict(
                            "Custom slug already in use",
                            json!({ "custom_slug": slug }),
                        ));
                    }

                    debug!(code = %code, remaining, "Lost short code race, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn probe(&self, remaining: &mut usize) -> Result<String, AppError> {
        while *remaining > 0 {
            *remaining -= 1;

            let code = generate_code();
            if self.repository.find_by_code(&code).await?.is_none() {
                return Ok(code);
            }
        }

        warn!(
            attempts = MAX_ALLOCATION_ATTEMPTS,
            "Short code allocation exhausted"
        );

        Err(AppError::allocation_exhausted(
            "Failed to allocate a unique short code",
            json!({ "attempts": MAX_ALLOCATION_ATTEMPTS }),
        ))
    }
}
