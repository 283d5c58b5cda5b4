//! Owner-facing link management: creation, updates, listing and deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, warn};

use super::code_allocator::{CodeAllocator, LinkDraft};
use super::ownership::find_owned;
use crate::domain::entities::{LinkPatch, LinkRecord, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheService;
use crate::utils::code_generator::validate_custom_slug;
use crate::utils::url_validator::validate_destination;

/// Service for creating and managing an owner's short links.
///
/// Every mutation checks ownership first and, once the store has accepted
/// it, evicts every code the record held before and after the change from
/// the redirect cache.
pub struct LinkService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    allocator: CodeAllocator<L>,
    cache: Arc<dyn CacheService>,
    base_url: String,
}

/// Treats a blank slug as "no slug".
fn normalize_slug(slug: Option<String>) -> Option<String> {
    slug.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    pub fn new(repository: Arc<L>, cache: Arc<dyn CacheService>, base_url: String) -> Self {
        Self {
            allocator: CodeAllocator::new(repository.clone()),
            repository,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Creates a short link owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL or slug is invalid.
    /// Returns [`AppError::Conflict`] if the custom slug is already in use.
    /// Returns [`AppError::AllocationExhausted`] if no free short code was found.
    pub async fn create_link(
        &self,
        original_url: &str,
        owner_id: &OwnerId,
        custom_slug: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<LinkRecord, AppError> {
        let original_url = validate_destination(original_url)?;
        let custom_slug = normalize_slug(custom_slug);

        if let Some(slug) = &custom_slug {
            validate_custom_slug(slug)?;

            if self.repository.find_by_code(slug).await?.is_some() {
                return Err(AppError::conflict(
                    "Custom slug already in use",
                    json!({ "custom_slug": slug }),
                ));
            }
        }

        let draft = LinkDraft {
            original_url,
            custom_slug,
            owner_id: owner_id.clone(),
            expires_at,
        };

        let record = self.allocator.insert_with_fresh_code(&draft).await?;

        info!(
            id = record.id,
            code = %record.short_code,
            owner = %owner_id,
            "Short link created"
        );

        Ok(record)
    }

    /// Returns one of the owner's links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] or [`AppError::Forbidden`].
    pub async fn get_link(&self, id: i64, owner_id: &OwnerId) -> Result<LinkRecord, AppError> {
        find_owned(self.repository.as_ref(), id, owner_id).await
    }

    /// Lists the owner's links, newest first.
    ///
    /// `page` is 1-based. Returns the page and the total number of matches.
    pub async fn list_links(
        &self,
        owner_id: &OwnerId,
        page: i64,
        page_size: i64,
        search: Option<String>,
    ) -> Result<(Vec<LinkRecord>, i64), AppError> {
        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let offset = (page.max(1) - 1) * page_size;

        let items = self
            .repository
            .list_by_owner(owner_id, offset, page_size, search.clone())
            .await?;
        let total = self.repository.count_by_owner(owner_id, search).await?;

        Ok((items, total))
    }

    /// Enables or disables redirection for a link.
    pub async fn set_active(
        &self,
        id: i64,
        owner_id: &OwnerId,
        active: bool,
    ) -> Result<LinkRecord, AppError> {
        let patch = LinkPatch {
            is_active: Some(active),
            ..Default::default()
        };
        self.update_link(id, owner_id, patch).await
    }

    /// Sets, replaces or (with `None`) clears the custom slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the slug is held by another link.
    pub async fn update_slug(
        &self,
        id: i64,
        owner_id: &OwnerId,
        new_slug: Option<String>,
    ) -> Result<LinkRecord, AppError> {
        let patch = LinkPatch {
            custom_slug: Some(new_slug),
            ..Default::default()
        };
        self.update_link(id, owner_id, patch).await
    }

    /// Points a link at a new destination.
    pub async fn update_destination(
        &self,
        id: i64,
        owner_id: &OwnerId,
        original_url: &str,
    ) -> Result<LinkRecord, AppError> {
        let patch = LinkPatch {
            original_url: Some(original_url.to_string()),
            ..Default::default()
        };
        self.update_link(id, owner_id, patch).await
    }

    /// Sets or clears the expiry time.
    ///
    /// A time in the past is accepted and expires the link immediately.
    pub async fn set_expiry(
        &self,
        id: i64,
        owner_id: &OwnerId,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<LinkRecord, AppError> {
        let patch = LinkPatch {
            expires_at: Some(expires_at),
            ..Default::default()
        };
        self.update_link(id, owner_id, patch).await
    }

    /// Validates and applies a partial update on behalf of the owner.
    ///
    /// An empty patch returns the record unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`], [`AppError::Forbidden`],
    /// [`AppError::Validation`] or [`AppError::Conflict`].
    pub async fn update_link(
        &self,
        id: i64,
        owner_id: &OwnerId,
        mut patch: LinkPatch,
    ) -> Result<LinkRecord, AppError> {
        let current = find_owned(self.repository.as_ref(), id, owner_id).await?;

        if let Some(url) = &patch.original_url {
            patch.original_url = Some(validate_destination(url)?);
        }

        if let Some(slug) = patch.custom_slug.take() {
            let slug = normalize_slug(slug);

            if let Some(s) = &slug
                && current.custom_slug.as_ref() != Some(s)
            {
                validate_custom_slug(s)?;

                if let Some(holder) = self.repository.find_by_code(s).await?
                    && holder.id != id
                {
                    return Err(AppError::conflict(
                        "Custom slug already in use",
                        json!({ "custom_slug": s }),
                    ));
                }
            }

            patch.custom_slug = Some(slug);
        }

        if patch.is_empty() {
            return Ok(current);
        }

        let updated = self.repository.update(id, patch).await?;

        self.evict(current.codes().chain(updated.codes())).await;
        info!(id, owner = %owner_id, "Short link updated");

        Ok(updated)
    }

    /// Permanently deletes a link and its click history.
    pub async fn delete_link(&self, id: i64, owner_id: &OwnerId) -> Result<(), AppError> {
        let current = find_owned(self.repository.as_ref(), id, owner_id).await?;

        if !self.repository.delete(id).await? {
            return Err(AppError::not_found("Link not found", json!({ "id": id })));
        }

        self.evict(current.codes()).await;
        info!(id, owner = %owner_id, "Short link deleted");

        Ok(())
    }

    /// Public URL of a link: `BASE_URL/<slug or short code>`.
    pub fn short_url(&self, record: &LinkRecord) -> String {
        format!("{}/{}", self.base_url, record.public_code())
    }

    async fn evict<'a>(&self, codes: impl Iterator<Item = &'a str>) {
        for code in codes {
            if let Err(e) = self.cache.invalidate(code).await {
                warn!(code, error = %e, "Failed to invalidate cached link");
            }
        }
    }
}
