//! API route configuration.

use crate::api::handlers::{
    create_link_handler, delete_link_handler, disable_link_handler, enable_link_handler,
    get_link_handler, list_links_handler, stats_handler, track_click_handler, update_link_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// Owner routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST   /links`               - Create a short link
/// - `GET    /links`               - List the owner's links (paginated, searchable)
/// - `GET    /links/{id}`          - Fetch one link
/// - `PATCH  /links/{id}`          - Update destination, slug or expiry
/// - `DELETE /links/{id}`          - Permanently delete a link
/// - `PUT    /links/{id}/enable`   - Re-enable redirection
/// - `PUT    /links/{id}/disable`  - Disable redirection
/// - `GET    /links/{id}/stats`    - Click statistics for a date window
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler).get(list_links_handler))
        .route(
            "/links/{id}",
            get(get_link_handler)
                .patch(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/links/{id}/enable", put(enable_link_handler))
        .route("/links/{id}/disable", put(disable_link_handler))
        .route("/links/{id}/stats", get(stats_handler))
}

/// Unauthenticated API routes.
///
/// # Endpoints
///
/// - `POST /links/{id}/click` - Manual click tracking
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/links/{id}/click", post(track_click_handler))
}
