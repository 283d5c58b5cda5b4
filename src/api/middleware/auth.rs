//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use tracing::debug;

use crate::{error::AppError, state::AppState};

/// Authenticates requests and attaches the caller's [`OwnerId`].
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <owner_id>.<hex hmac>
/// ```
///
/// On success the verified [`OwnerId`] is inserted into the request
/// extensions, where handlers read it with `Extension<OwnerId>`.
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is missing, malformed or the MAC
/// does not verify. 401 responses carry `WWW-Authenticate: Bearer`.
///
/// [`OwnerId`]: crate::domain::entities::OwnerId
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let owner = st.auth_service.authenticate(&token)?;
    debug!(owner = %owner, "Authenticated request");

    parts.extensions.insert(owner);
    let req = Request::from_parts(parts, body);

    Ok(next.run(req).await)
}
