//! Process-local implementation of the link repository.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::entities::{ClickEvent, LinkPatch, LinkRecord, NewLinkRecord, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

struct StoredLink {
    record: LinkRecord,
    clicks: Vec<ClickEvent>,
}

#[derive(Default)]
struct MemoryState {
    links: HashMap<i64, StoredLink>,
    /// Single index over short codes and slugs.
    codes: HashMap<String, i64>,
    next_id: i64,
}

impl MemoryState {
    /// Returns the id holding `code`, unless it is `owner`.
    fn holder_other_than(&self, code: &str, owner: Option<i64>) -> Option<i64> {
        self.codes
            .get(code)
            .copied()
            .filter(|holder| Some(*holder) != owner)
    }
}

/// In-memory link store.
///
/// Every mutation runs under one write lock, so namespace checks and writes
/// are a single step and click appends never interleave with each other.
/// Data lives only as long as the process; intended for development,
/// single-instance deployments and tests.
#[derive(Default)]
pub struct InMemoryLinkRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn code_conflict(code: &str) -> AppError {
    AppError::conflict("Code is already in use", json!({ "code": code }))
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}

fn matches_search(record: &LinkRecord, needle: &str) -> bool {
    record.original_url.to_lowercase().contains(needle)
        || record.short_code.to_lowercase().contains(needle)
        || record
            .custom_slug
            .as_deref()
            .is_some_and(|s| s.to_lowercase().contains(needle))
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn insert(&self, new_link: NewLinkRecord) -> Result<LinkRecord, AppError> {
        let mut state = self.state.write().await;

        if state.codes.contains_key(&new_link.short_code) {
            return Err(code_conflict(&new_link.short_code));
        }
        if let Some(slug) = &new_link.custom_slug
            && state.codes.contains_key(slug)
        {
            return Err(code_conflict(slug));
        }

        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();

        let record = LinkRecord {
            id,
            original_url: new_link.original_url,
            short_code: new_link.short_code,
            custom_slug: new_link.custom_slug,
            owner_id: new_link.owner_id,
            click_count: 0,
            is_active: true,
            expires_at: new_link.expires_at,
            created_at: now,
            updated_at: now,
        };

        for code in record.codes() {
            state.codes.insert(code.to_string(), id);
        }
        state.links.insert(
            id,
            StoredLink {
                record: record.clone(),
                clicks: Vec::new(),
            },
        );

        Ok(record)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<LinkRecord>, AppError> {
        let state = self.state.read().await;

        Ok(state
            .codes
            .get(code)
            .and_then(|id| state.links.get(id))
            .map(|stored| stored.record.clone()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<LinkRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state.links.get(&id).map(|stored| stored.record.clone()))
    }

    async fn find_by_owner_and_id(
        &self,
        owner_id: &OwnerId,
        id: i64,
    ) -> Result<Option<LinkRecord>, AppError> {
        let state = self.state.read().await;

        Ok(state
            .links
            .get(&id)
            .filter(|stored| stored.record.is_owned_by(owner_id))
            .map(|stored| stored.record.clone()))
    }

    async fn list_by_owner(
        &self,
        owner_id: &OwnerId,
        offset: i64,
        limit: i64,
        search: Option<String>,
    ) -> Result<Vec<LinkRecord>, AppError> {
        let state = self.state.read().await;
        let needle = search.map(|s| s.to_lowercase());

        let mut records: Vec<&LinkRecord> = state
            .links
            .values()
            .map(|stored| &stored.record)
            .filter(|r| r.is_owned_by(owner_id))
            .filter(|r| needle.as_deref().is_none_or(|n| matches_search(r, n)))
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(records
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_by_owner(
        &self,
        owner_id: &OwnerId,
        search: Option<String>,
    ) -> Result<i64, AppError> {
        let state = self.state.read().await;
        let needle = search.map(|s| s.to_lowercase());

        let count = state
            .links
            .values()
            .map(|stored| &stored.record)
            .filter(|r| r.is_owned_by(owner_id))
            .filter(|r| needle.as_deref().is_none_or(|n| matches_search(r, n)))
            .count();

        Ok(count as i64)
    }

    async fn update(&self, id: i64, patch: LinkPatch) -> Result<LinkRecord, AppError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        let (short_code, old_slug) = {
            let stored = state.links.get(&id).ok_or_else(|| link_not_found(id))?;
            (
                stored.record.short_code.clone(),
                stored.record.custom_slug.clone(),
            )
        };

        if let Some(new_slug) = &patch.custom_slug
            && *new_slug != old_slug
        {
            if let Some(slug) = new_slug
                && state.holder_other_than(slug, Some(id)).is_some()
            {
                return Err(code_conflict(slug));
            }

            if let Some(old) = &old_slug
                && *old != short_code
            {
                state.codes.remove(old);
            }
            if let Some(slug) = new_slug {
                state.codes.insert(slug.clone(), id);
            }
        }

        let stored = state.links.get_mut(&id).ok_or_else(|| link_not_found(id))?;
        let record = &mut stored.record;

        if let Some(url) = patch.original_url {
            record.original_url = url;
        }
        if let Some(slug) = patch.custom_slug {
            record.custom_slug = slug;
        }
        if let Some(active) = patch.is_active {
            record.is_active = active;
        }
        if let Some(expires_at) = patch.expires_at {
            record.expires_at = expires_at;
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;

        let Some(stored) = state.links.remove(&id) else {
            return Ok(false);
        };

        for code in stored.record.codes() {
            if state.codes.get(code) == Some(&id) {
                state.codes.remove(code);
            }
        }

        Ok(true)
    }

    async fn record_click(&self, id: i64, event: ClickEvent) -> Result<i64, AppError> {
        let mut state = self.state.write().await;
        let stored = state.links.get_mut(&id).ok_or_else(|| link_not_found(id))?;

        stored.clicks.push(event);
        stored.record.click_count += 1;

        Ok(stored.record.click_count)
    }

    async fn find_clicks(&self, id: i64) -> Result<Vec<ClickEvent>, AppError> {
        let state = self.state.read().await;

        state
            .links
            .get(&id)
            .map(|stored| stored.clicks.clone())
            .ok_or_else(|| link_not_found(id))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
