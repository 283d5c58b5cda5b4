//! Short code resolution and click dispatch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::click_job::PendingClick;
use crate::domain::entities::{ClickContext, ClickEvent};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, CachedTarget};

/// A code that passed the activation and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub record_id: i64,
    pub original_url: String,
}

/// Applies the redirect policy: disabled is checked before expired.
fn check_policy(code: &str, target: &CachedTarget, now: DateTime<Utc>) -> Result<(), AppError> {
    if !target.is_active {
        return Err(AppError::disabled(
            "Short link not found or disabled",
            json!({ "code": code }),
        ));
    }

    if let Some(expires_at) = target.expires_at
        && expires_at <= now
    {
        return Err(AppError::expired(
            "Short link has expired",
            json!({ "code": code, "expires_at": expires_at }),
        ));
    }

    Ok(())
}

/// Resolves inbound codes and hands clicks to the background recorder.
///
/// The redirect path never waits on click storage: clicks go into a bounded
/// queue with `try_send`, and a full or closed queue drops the click.
pub struct RedirectService<L: LinkRepository + ?Sized> {
    repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    click_sender: mpsc::Sender<PendingClick>,
}

impl<L: LinkRepository + ?Sized> RedirectService<L> {
    pub fn new(
        repository: Arc<L>,
        cache: Arc<dyn CacheService>,
        click_sender: mpsc::Sender<PendingClick>,
    ) -> Self {
        Self {
            repository,
            cache,
            click_sender,
        }
    }

    /// Looks up `code` as a short code or slug and checks that it may redirect.
    ///
    /// Unauthenticated; ownership plays no part.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`], [`AppError::Disabled`] or
    /// [`AppError::Expired`], checked in that order.
    pub async fn resolve(&self, code: &str) -> Result<Resolution, AppError> {
        let target = match self.cache.get_target(code).await {
            Ok(Some(target)) => target,
            Ok(None) | Err(_) => self.load_and_cache(code).await?,
        };

        check_policy(code, &target, Utc::now())?;

        Ok(Resolution {
            record_id: target.record_id,
            original_url: target.original_url,
        })
    }

    async fn load(&self, code: &str) -> Result<Option<CachedTarget>, AppError> {
        Ok(self
            .repository
            .find_by_code(code)
            .await?
            .map(|record| CachedTarget::from(&record)))
    }

    /// Reads `code` from the store and fills the cache with it.
    ///
    /// An owner mutation may commit and evict between the store read and the
    /// cache write. The store is read again after the write, and an entry
    /// that no longer matches is evicted; the fresh state is returned.
    async fn load_and_cache(&self, code: &str) -> Result<CachedTarget, AppError> {
        let not_found = || AppError::not_found("Short link not found", json!({ "code": code }));

        let target = self.load(code).await?.ok_or_else(not_found)?;
        if !self.cache.is_enabled() {
            return Ok(target);
        }

        if let Err(e) = self.cache.set_target(code, &target, None).await {
            warn!(code, error = %e, "Failed to cache link");
            return Ok(target);
        }

        let current = self.load(code).await?;
        if current.as_ref() == Some(&target) {
            return Ok(target);
        }

        debug!(code, "Link changed while caching, evicting");
        if let Err(e) = self.cache.invalidate(code).await {
            warn!(code, error = %e, "Failed to evict stale cache entry");
        }
        current.ok_or_else(not_found)
    }

    /// Resolves `code` and queues a click built from `context`.
    pub async fn redirect(
        &self,
        code: &str,
        context: ClickContext,
    ) -> Result<Resolution, AppError> {
        let resolution = self.resolve(code).await?;
        self.dispatch_click(resolution.record_id, context);
        Ok(resolution)
    }

    /// Queues a click without waiting. Returns whether it was accepted.
    pub fn dispatch_click(&self, record_id: i64, context: ClickContext) -> bool {
        let job = PendingClick::new(record_id, ClickEvent::new(Utc::now(), context));

        match self.click_sender.try_send(job) {
            Ok(()) => {
                debug!(record_id, "Click queued");
                true
            }
            Err(TrySendError::Full(_)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                warn!(record_id, "Click queue full, dropping click");
                false
            }
            Err(TrySendError::Closed(_)) => {
                metrics::counter!("clicks_dropped_total").increment(1);
                warn!(record_id, "Click queue closed, dropping click");
                false
            }
        }
    }

    /// Remaining free slots in the click queue.
    pub fn queue_capacity(&self) -> usize {
        self.click_sender.capacity()
    }

    pub fn queue_is_closed(&self) -> bool {
        self.click_sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{LinkPatch, NewLinkRecord, OwnerId};
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{MockCacheService, NullCache};
    use crate::application::services::LinkService;
    use crate::infrastructure::cache::CacheResult;
    use crate::infrastructure::persistence::InMemoryLinkRepository;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    /// In-memory cache whose first `set_target` parks until released.
    struct GatedCache {
        entries: Mutex<HashMap<String, CachedTarget>>,
        armed: AtomicBool,
        entered: Notify,
        release: Notify,
    }

    impl GatedCache {
        fn new() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                armed: AtomicBool::new(true),
                entered: Notify::new(),
                release: Notify::new(),
            }
        }

        fn entry(&self, code: &str) -> Option<CachedTarget> {
            self.entries.lock().unwrap().get(code).cloned()
        }
    }

    #[async_trait]
    impl CacheService for GatedCache {
        async fn get_target(&self, code: &str) -> CacheResult<Option<CachedTarget>> {
            Ok(self.entry(code))
        }

        async fn set_target(
            &self,
            code: &str,
            target: &CachedTarget,
            _ttl_seconds: Option<u64>,
        ) -> CacheResult<()> {
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.entries
                .lock()
                .unwrap()
                .insert(code.to_string(), target.clone());
            Ok(())
        }

        async fn invalidate(&self, code: &str) -> CacheResult<()> {
            self.entries.lock().unwrap().remove(code);
            Ok(())
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn is_enabled(&self) -> bool {
            true
        }
    }

    /// A redirect and a link service sharing one gated cache over one store.
    fn gated_services(
        repository: Arc<InMemoryLinkRepository>,
    ) -> (
        Arc<RedirectService<InMemoryLinkRepository>>,
        LinkService<InMemoryLinkRepository>,
        Arc<GatedCache>,
    ) {
        let cache = Arc::new(GatedCache::new());
        let (tx, _rx) = mpsc::channel(16);
        let redirects = RedirectService::new(repository.clone(), cache.clone(), tx);
        let links = LinkService::new(repository, cache.clone(), "https://s.example.com".to_string());
        (Arc::new(redirects), links, cache)
    }

    async fn seeded(
        slug: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> (Arc<InMemoryLinkRepository>, i64) {
        let repository = Arc::new(InMemoryLinkRepository::new());
        let link = repository
            .insert(NewLinkRecord {
                original_url: "https://example.com/target".to_string(),
                short_code: "abc123".to_string(),
                custom_slug: slug.map(str::to_string),
                owner_id: OwnerId::new("alice"),
                expires_at,
            })
            .await
            .unwrap();
        (repository, link.id)
    }

    fn service<L: LinkRepository + ?Sized>(
        repository: Arc<L>,
        capacity: usize,
    ) -> (RedirectService<L>, mpsc::Receiver<PendingClick>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            RedirectService::new(repository, Arc::new(NullCache::new()), tx),
            rx,
        )
    }

    #[tokio::test]
    async fn test_resolve_by_code_and_slug() {
        let (repository, id) = seeded(Some("promo"), None).await;
        let (service, _rx) = service(repository, 10);

        for code in ["abc123", "promo"] {
            let resolution = service.resolve(code).await.unwrap();
            assert_eq!(resolution.record_id, id);
            assert_eq!(resolution.original_url, "https://example.com/target");
        }
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let (repository, _) = seeded(None, None).await;
        let (service, _rx) = service(repository, 10);

        let err = service.resolve("nope00").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_disabled_checked_before_expired() {
        let past = Utc::now() - Duration::days(1);
        let (repository, id) = seeded(None, Some(past)).await;
        repository
            .update(
                id,
                LinkPatch {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let (service, _rx) = service(repository, 10);

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, AppError::Disabled { .. }));
    }

    #[tokio::test]
    async fn test_active_but_expired() {
        let past = Utc::now() - Duration::seconds(1);
        let (repository, _) = seeded(None, Some(past)).await;
        let (service, _rx) = service(repository, 10);

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, AppError::Expired { .. }));
    }

    #[tokio::test]
    async fn test_future_expiry_still_resolves() {
        let future = Utc::now() + Duration::days(1);
        let (repository, _) = seeded(None, Some(future)).await;
        let (service, _rx) = service(repository, 10);

        assert!(service.resolve("abc123").await.is_ok());
    }

    #[tokio::test]
    async fn test_redirect_queues_click() {
        let (repository, id) = seeded(None, None).await;
        let (service, mut rx) = service(repository, 10);

        service
            .redirect("abc123", ClickContext::default())
            .await
            .unwrap();

        let job = rx.recv().await.unwrap();
        assert_eq!(job.record_id, id);
    }

    #[tokio::test]
    async fn test_redirect_survives_full_queue() {
        let (repository, _) = seeded(None, None).await;
        let (service, _rx) = service(repository, 1);

        service
            .redirect("abc123", ClickContext::default())
            .await
            .unwrap();
        let second = service
            .redirect("abc123", ClickContext::default())
            .await
            .unwrap();

        assert_eq!(second.original_url, "https://example.com/target");
        assert!(!service.dispatch_click(1, ClickContext::default()));
    }

    #[tokio::test]
    async fn test_redirect_survives_closed_queue() {
        let (repository, _) = seeded(None, None).await;
        let (service, rx) = service(repository, 4);
        drop(rx);

        assert!(
            service
                .redirect("abc123", ClickContext::default())
                .await
                .is_ok()
        );
        assert!(service.queue_is_closed());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_store() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo.expect_find_by_code().times(0);

        let mut cache = MockCacheService::new();
        cache.expect_get_target().times(1).returning(|_| {
            Ok(Some(CachedTarget {
                record_id: 9,
                original_url: "https://cached.example".to_string(),
                is_active: true,
                expires_at: None,
            }))
        });

        let (tx, _rx) = mpsc::channel(1);
        let service = RedirectService::new(Arc::new(mock_repo), Arc::new(cache), tx);

        let resolution = service.resolve("abc123").await.unwrap();
        assert_eq!(resolution.record_id, 9);
        assert_eq!(resolution.original_url, "https://cached.example");
    }

    #[tokio::test]
    async fn test_cached_disabled_target_is_rejected() {
        let mut cache = MockCacheService::new();
        cache.expect_get_target().returning(|_| {
            Ok(Some(CachedTarget {
                record_id: 9,
                original_url: "https://cached.example".to_string(),
                is_active: false,
                expires_at: None,
            }))
        });

        let (tx, _rx) = mpsc::channel(1);
        let service = RedirectService::new(Arc::new(MockLinkRepository::new()), Arc::new(cache), tx);

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, AppError::Disabled { .. }));
    }

    #[tokio::test]
    async fn test_cache_miss_populates_cache() {
        let (repository, id) = seeded(None, None).await;

        let mut cache = MockCacheService::new();
        cache.expect_get_target().times(1).returning(|_| Ok(None));
        cache.expect_is_enabled().return_const(true);
        cache.expect_invalidate().times(0);
        cache
            .expect_set_target()
            .withf(move |code, target, ttl| {
                code == "abc123" && target.record_id == id && ttl.is_none()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let (tx, _rx) = mpsc::channel(1);
        let service = RedirectService::new(repository, Arc::new(cache), tx);

        assert!(service.resolve("abc123").await.is_ok());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let mut mock_repo = MockLinkRepository::new();
        mock_repo
            .expect_find_by_code()
            .returning(|_| Err(AppError::storage_unavailable("down", json!({}))));

        let (service, _rx) = service(Arc::new(mock_repo), 1);

        let err = service.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_disable_during_cache_fill_is_not_overwritten() {
        let (repository, id) = seeded(None, None).await;
        let (redirects, links, cache) = gated_services(repository);

        let resolving = tokio::spawn({
            let redirects = redirects.clone();
            async move { redirects.resolve("abc123").await }
        });

        // The resolver has read the active record and is about to cache it.
        cache.entered.notified().await;
        links
            .set_active(id, &OwnerId::new("alice"), false)
            .await
            .unwrap();
        cache.release.notify_one();

        let err = resolving.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Disabled { .. }));
        assert!(cache.entry("abc123").is_none_or(|target| !target.is_active));

        let err = redirects.resolve("abc123").await.unwrap_err();
        assert!(matches!(err, AppError::Disabled { .. }));
    }

    #[tokio::test]
    async fn test_released_slug_during_cache_fill_stops_resolving() {
        let (repository, id) = seeded(Some("promo"), None).await;
        let (redirects, links, cache) = gated_services(repository);

        let resolving = tokio::spawn({
            let redirects = redirects.clone();
            async move { redirects.resolve("promo").await }
        });

        cache.entered.notified().await;
        links
            .update_slug(id, &OwnerId::new("alice"), None)
            .await
            .unwrap();
        cache.release.notify_one();

        let err = resolving.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(cache.entry("promo").is_none());

        let err = redirects.resolve("promo").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
        assert!(redirects.resolve("abc123").await.is_ok());
    }

    #[tokio::test]
    async fn test_unchanged_link_stays_cached() {
        let (repository, id) = seeded(None, None).await;
        let (redirects, _links, cache) = gated_services(repository);
        cache.armed.store(false, Ordering::SeqCst);

        redirects.resolve("abc123").await.unwrap();

        let cached = cache.entry("abc123").unwrap();
        assert_eq!(cached.record_id, id);
        assert!(cached.is_active);
    }
}
