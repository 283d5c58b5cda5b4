//! Shared application state injected into every handler.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::services::{AuthService, LinkService, RedirectService, StatsService};
use crate::domain::click_job::PendingClick;
use crate::domain::repositories::LinkRepository;
use crate::infrastructure::cache::CacheService;

/// Services wired over whichever link store the server was started with.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn LinkRepository>,
    pub link_service: Arc<LinkService<dyn LinkRepository>>,
    pub redirect_service: Arc<RedirectService<dyn LinkRepository>>,
    pub stats_service: Arc<StatsService<dyn LinkRepository>>,
    pub auth_service: Arc<AuthService>,
    pub cache: Arc<dyn CacheService>,
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn LinkRepository>,
        cache: Arc<dyn CacheService>,
        click_sender: mpsc::Sender<PendingClick>,
        signing_secret: String,
        base_url: String,
        behind_proxy: bool,
    ) -> Self {
        Self {
            link_service: Arc::new(LinkService::new(
                repository.clone(),
                cache.clone(),
                base_url,
            )),
            redirect_service: Arc::new(RedirectService::new(
                repository.clone(),
                cache.clone(),
                click_sender,
            )),
            stats_service: Arc::new(StatsService::new(repository.clone())),
            auth_service: Arc::new(AuthService::new(signing_secret)),
            repository,
            cache,
            behind_proxy,
        }
    }
}
