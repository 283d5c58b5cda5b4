//! Link record entity: a short code mapped to a destination URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to the principal that owns a link.
///
/// The value is produced by the identity collaborator and never interpreted
/// here beyond equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored short link.
///
/// `short_code` and `owner_id` never change after creation. `custom_slug`
/// shares the short-code namespace: no value may appear as a short code or
/// slug of two different records. Click events are kept by the store and
/// loaded separately; `click_count` always equals their number.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub custom_slug: Option<String>,
    pub owner_id: OwnerId,
    pub click_count: i64,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LinkRecord {
    /// Returns true if `expires_at` is set and not after `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| e <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// The code shown to visitors: the slug when present, otherwise the short code.
    pub fn public_code(&self) -> &str {
        self.custom_slug.as_deref().unwrap_or(&self.short_code)
    }

    /// All namespace values currently held by this record.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.short_code.as_str()).chain(self.custom_slug.as_deref())
    }

    pub fn is_owned_by(&self, owner_id: &OwnerId) -> bool {
        &self.owner_id == owner_id
    }
}

/// Input data for inserting a new link.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLinkRecord {
    pub original_url: String,
    pub short_code: String,
    pub custom_slug: Option<String>,
    pub owner_id: OwnerId,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of the owner-mutable fields.
///
/// `None` fields are left unchanged. For the double options, `Some(None)`
/// clears the value and `Some(Some(v))` sets it. Click fields are not part
/// of a patch; they only change through click recording.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkPatch {
    pub original_url: Option<String>,
    pub custom_slug: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl LinkPatch {
    pub fn is_empty(&self) -> bool {
        self.original_url.is_none()
            && self.custom_slug.is_none()
            && self.is_active.is_none()
            && self.expires_at.is_none()
    }
}
