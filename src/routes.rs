//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short link redirect (public)
//! - `GET  /health`      - Health check: storage, cache, click queue (public)
//! - `/api/*`            - REST API (Bearer token required, except click tracking)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket on `/api` (proxy-aware when configured)
//! - **Authentication** - Bearer owner token
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the router without path normalization.
///
/// `behind_proxy` switches rate limiting from the socket peer address to
/// `X-Forwarded-For` / `X-Real-IP`; enable only behind a trusted proxy.
pub fn router(state: AppState) -> Router {
    let behind_proxy = state.behind_proxy;

    let protected = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
    let public = api::routes::public_routes();

    let (protected, public) = if behind_proxy {
        (
            protected.layer(rate_limit::proxied_secure_layer()),
            public.layer(rate_limit::proxied_layer()),
        )
    } else {
        (
            protected.layer(rate_limit::secure_layer()),
            public.layer(rate_limit::layer()),
        )
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/{code}", get(redirect_handler))
        .nest("/api", Router::new().merge(protected).merge(public))
        .with_state(state)
        .layer(tracing::layer())
}

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}
