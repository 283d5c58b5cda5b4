//! Ownership lookup shared by the owner-facing services.

use serde_json::json;

use crate::domain::entities::{LinkRecord, OwnerId};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Loads a record on behalf of `owner_id`.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] if the record does not exist and
/// [`AppError::Forbidden`] if it belongs to someone else.
pub(crate) async fn find_owned<L>(
    repository: &L,
    id: i64,
    owner_id: &OwnerId,
) -> Result<LinkRecord, AppError>
where
    L: LinkRepository + ?Sized,
{
    if let Some(record) = repository.find_by_owner_and_id(owner_id, id).await? {
        return Ok(record);
    }

    match repository.find_by_id(id).await? {
        Some(_) => Err(AppError::forbidden(
            "You do not own this link",
            json!({ "id": id }),
        )),
        None => Err(AppError::not_found("Link not found", json!({ "id": id }))),
    }
}
