//! Business logic services for the application layer.

pub mod auth_service;
pub mod code_allocator;
pub mod link_service;
mod ownership;
pub mod redirect_service;
pub mod stats_service;

pub use auth_service::AuthService;
pub use code_allocator::{CodeAllocator, LinkDraft, MAX_ALLOCATION_ATTEMPTS};
pub use link_service::LinkService;
pub use redirect_service::{RedirectService, Resolution};
pub use stats_service::{LinkStats, StatsService};
