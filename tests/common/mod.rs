#![allow(dead_code)]

use axum::Router;
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

use linkpulse::application::services::AuthService;
use linkpulse::domain::click_job::PendingClick;
use linkpulse::domain::entities::{LinkRecord, NewLinkRecord, OwnerId};
use linkpulse::domain::repositories::LinkRepository;
use linkpulse::infrastructure::cache::NullCache;
use linkpulse::infrastructure::persistence::InMemoryLinkRepository;
use linkpulse::routes::router;
use linkpulse::state::AppState;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const BASE_URL: &str = "https://pulse.test";

/// Inserts a fixed peer address, standing in for `into_make_service_with_connect_info`.
#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// Memory-backed state plus the receiving end of its click queue.
pub fn create_test_state() -> (
    AppState,
    Arc<InMemoryLinkRepository>,
    mpsc::Receiver<PendingClick>,
) {
    create_test_state_with_capacity(100)
}

pub fn create_test_state_with_capacity(
    capacity: usize,
) -> (
    AppState,
    Arc<InMemoryLinkRepository>,
    mpsc::Receiver<PendingClick>,
) {
    let repository = Arc::new(InMemoryLinkRepository::new());
    let (tx, rx) = mpsc::channel(capacity);

    let state = AppState::new(
        repository.clone(),
        Arc::new(NullCache::new()),
        tx,
        SIGNING_SECRET.to_string(),
        BASE_URL.to_string(),
        false,
    );

    (state, repository, rx)
}

/// The full application router, with a fake peer address.
pub fn create_test_server(state: AppState) -> TestServer {
    let app: Router = router(state).layer(MockConnectInfoLayer);
    TestServer::new(app).unwrap()
}

pub fn token_for(owner: &str) -> String {
    AuthService::new(SIGNING_SECRET.to_string())
        .sign(&OwnerId::new(owner))
        .unwrap()
}

pub async fn create_test_link(
    repository: &InMemoryLinkRepository,
    owner: &str,
    code: &str,
    url: &str,
) -> LinkRecord {
    repository
        .insert(NewLinkRecord {
            original_url: url.to_string(),
            short_code: code.to_string(),
            custom_slug: None,
            owner_id: OwnerId::new(owner),
            expires_at: None,
        })
        .await
        .unwrap()
}
