//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume the [`LinkRepository`]
//! trait and provide a clean API for HTTP handlers.
//!
//! # Available Services
//!
//! - [`services::code_allocator::CodeAllocator`] - Collision-free short code allocation
//! - [`services::link_service::LinkService`] - Link creation and owner-side management
//! - [`services::redirect_service::RedirectService`] - Code resolution and click dispatch
//! - [`services::stats_service::StatsService`] - Click recording and analytics
//! - [`services::auth_service::AuthService`] - Owner token verification
//!
//! [`LinkRepository`]: crate::domain::repositories::LinkRepository

pub mod services;
