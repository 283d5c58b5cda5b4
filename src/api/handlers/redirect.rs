//! Handler for short URL redirect.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use std::net::SocketAddr;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_context::extract_click_context;

/// Redirects a short code or slug to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code (cache first, then the link store)
/// 2. Reject disabled links (404) and expired links (410)
/// 3. Queue a click built from the peer address and headers
/// 4. Return 302 Found
///
/// # Click Tracking
///
/// Click events go to a bounded channel for async processing.
/// If the queue is full, the click is dropped; the redirect never waits on
/// click storage.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, AppError> {
    let context = extract_click_context(&headers, Some(addr), state.behind_proxy);

    let resolution = state.redirect_service.redirect(&code, context).await?;

    debug!(code, record_id = resolution.record_id, "Redirecting");

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, resolution.original_url)],
    ))
}
