//! Link repository implementations.
//!
//! # Repositories
//!
//! - [`InMemoryLinkRepository`] - Process-local store behind a single lock
//! - [`PgLinkRepository`] - PostgreSQL store using SQLx

pub mod memory_link_repository;
pub mod pg_link_repository;

pub use memory_link_repository::InMemoryLinkRepository;
pub use pg_link_repository::PgLinkRepository;
