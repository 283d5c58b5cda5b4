//! Cache service trait and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::LinkRecord;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Redirect-relevant fields of a link record.
///
/// Only fields an owner can change are cached, never click state, so an
/// entry stays correct as long as every owner mutation invalidates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTarget {
    pub record_id: i64,
    pub original_url: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&LinkRecord> for CachedTarget {
    fn from(record: &LinkRecord) -> Self {
        Self {
            record_id: record.id,
            original_url: record.original_url.clone(),
            is_active: record.is_active,
            expires_at: record.expires_at,
        }
    }
}

/// Trait for caching code → redirect target mappings.
///
/// Implementations must be thread-safe and handle errors gracefully without
/// disrupting the application (cache failures should degrade to store lookups).
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached target for a short code or slug.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(target))` on cache hit
    /// - `Ok(None)` on cache miss or error (fail-open behavior)
    async fn get_target(&self, code: &str) -> CacheResult<Option<CachedTarget>>;

    /// Stores a target with optional TTL.
    ///
    /// `ttl_seconds = None` uses the implementation's default. Errors are
    /// logged, not propagated.
    async fn set_target(
        &self,
        code: &str,
        target: &CachedTarget,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached target.
    ///
    /// Called for every code of a link whenever its owner changes or deletes it.
    async fn invalidate(&self, code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Whether entries written with [`set_target`](Self::set_target) are kept.
    fn is_enabled(&self) -> bool;
}
