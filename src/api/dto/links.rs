//! DTOs for link management endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::domain::entities::{LinkPatch, LinkRecord};

/// Request body for `POST /api/links`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(length(min = 1, max = 2048))]
    pub original_url: String,

    #[serde(default)]
    pub custom_slug: Option<String>,

    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Request body for `PATCH /api/links/{id}`.
///
/// Absent fields are left unchanged; `null` clears the slug or the expiry.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateLinkRequest {
    #[validate(length(min = 1, max = 2048))]
    #[serde(default)]
    pub original_url: Option<String>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub custom_slug: Option<Option<String>>,

    #[serde(default, with = "::serde_with::rust::double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateLinkRequest> for LinkPatch {
    fn from(req: UpdateLinkRequest) -> Self {
        LinkPatch {
            original_url: req.original_url,
            custom_slug: req.custom_slug,
            is_active: None,
            expires_at: req.expires_at,
        }
    }
}

/// Query parameters for `GET /api/links`.
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct ListLinksQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page: Option<u32>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    pub page_size: Option<u32>,

    #[serde(default)]
    pub search: Option<String>,
}

/// JSON representation of a link.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub custom_slug: Option<String>,
    pub short_url: String,
    pub click_count: i64,
    pub is_active: bool,
    pub is_expired: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkResponse {
    pub fn new(record: LinkRecord, short_url: String) -> Self {
        Self {
            is_expired: record.is_expired(),
            id: record.id,
            original_url: record.original_url,
            short_code: record.short_code,
            custom_slug: record.custom_slug,
            short_url,
            click_count: record.click_count,
            is_active: record.is_active,
            expires_at: record.expires_at,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// A page of the owner's links.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub items: Vec<LinkResponse>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
    pub total_pages: i64,
}

/// Response of the manual click tracking endpoint.
#[derive(Debug, Serialize)]
pub struct ClickTrackedResponse {
    pub message: String,
    pub click_count: i64,
}
