//! Handlers for link management endpoints.

use axum::{
    Extension, Json,
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use std::net::SocketAddr;
use validator::Validate;

use crate::api::dto::links::{
    ClickTrackedResponse, CreateLinkRequest, LinkListResponse, LinkResponse, ListLinksQuery,
    UpdateLinkRequest,
};
use crate::api::dto::pagination::Page;
use crate::domain::entities::{LinkRecord, OwnerId};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_context::extract_click_context;

fn to_response(state: &AppState, record: LinkRecord) -> LinkResponse {
    let short_url = state.link_service.short_url(&record);
    LinkResponse::new(record, short_url)
}

/// Creates a short link for the authenticated owner.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/some/long/path",
///   "custom_slug": "spring-sale",          // optional
///   "expires_at": "2030-01-01T00:00:00Z"   // optional
/// }
/// ```
///
/// # Errors
///
/// - 400 if the URL or slug is invalid
/// - 409 if the slug is already in use
/// - 500 if no free short code could be allocated
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let record = state
        .link_service
        .create_link(
            &payload.original_url,
            &owner,
            payload.custom_slug,
            payload.expires_at,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(&state, record))))
}

/// Lists the owner's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links?page=1&page_size=10&search=promo`
pub async fn list_links_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Query(params): Query<ListLinksQuery>,
) -> Result<Json<LinkListResponse>, AppError> {
    let page = Page::from_query(params.page, params.page_size)?;

    let (records, total) = state
        .link_service
        .list_links(
            &owner,
            i64::from(page.page),
            i64::from(page.page_size),
            params.search,
        )
        .await?;

    let items = records
        .into_iter()
        .map(|record| to_response(&state, record))
        .collect();

    Ok(Json(LinkListResponse {
        items,
        page: page.page,
        page_size: page.page_size,
        total,
        total_pages: page.total_pages(total),
    }))
}

/// `GET /api/links/{id}`
pub async fn get_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    let record = state.link_service.get_link(id, &owner).await?;
    Ok(Json(to_response(&state, record)))
}

/// Partially updates a link: destination, slug and expiry.
///
/// # Endpoint
///
/// `PATCH /api/links/{id}`
///
/// Absent fields are unchanged; `null` clears `custom_slug` or `expires_at`.
///
/// # Errors
///
/// - 400 on invalid values
/// - 403 if the link belongs to another owner
/// - 404 if the link does not exist
/// - 409 if the new slug is taken
pub async fn update_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let record = state
        .link_service
        .update_link(id, &owner, payload.into())
        .await?;

    Ok(Json(to_response(&state, record)))
}

/// `PUT /api/links/{id}/enable`
pub async fn enable_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    let record = state.link_service.set_active(id, &owner, true).await?;
    Ok(Json(to_response(&state, record)))
}

/// `PUT /api/links/{id}/disable`
pub async fn disable_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    let record = state.link_service.set_active(id, &owner, false).await?;
    Ok(Json(to_response(&state, record)))
}

/// Permanently deletes a link and its clicks.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// Returns 204 No Content on success.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.link_service.delete_link(id, &owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Records a click reported by a client, outside of a redirect.
///
/// # Endpoint
///
/// `POST /api/links/{id}/click` (public)
///
/// Unlike the redirect path the write is synchronous, so storage errors
/// reach the caller.
///
/// # Errors
///
/// - 404 if the link does not exist or is disabled
pub async fn track_click_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Json<ClickTrackedResponse>, AppError> {
    let context = extract_click_context(&headers, Some(addr), state.behind_proxy);

    let click_count = state.stats_service.track_click(id, context).await?;

    Ok(Json(ClickTrackedResponse {
        message: "Click recorded successfully".to_string(),
        click_count,
    }))
}
