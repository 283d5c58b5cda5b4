//! Core domain entities.
//!
//! # Entity Types
//!
//! - [`LinkRecord`] - A short code (and optional slug) mapped to a destination
//! - [`ClickEvent`] - One recorded visit of a link
//!
//! Creation and mutation use separate input types: [`NewLinkRecord`] for
//! inserts and [`LinkPatch`] for partial owner-side updates.

pub mod click;
pub mod link;

pub use click::{ClickContext, ClickEvent, DeviceType};
pub use link::{LinkPatch, LinkRecord, NewLinkRecord, OwnerId};
