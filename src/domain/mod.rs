//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Link records and click events
//! - [`repositories`] - Storage trait definitions
//! - [`stats`] - Windowed aggregation of click logs
//! - [`click_job`] - Queue message for asynchronous click recording
//! - [`click_worker`] - Background consumer of the click queue
//!
//! # Click Processing Flow
//!
//! 1. The redirect handler resolves a code via
//!    [`crate::application::services::RedirectService`]
//! 2. A [`click_job::PendingClick`] is pushed onto a bounded channel (non-blocking)
//! 3. [`click_worker::run_click_worker`] appends it through
//!    [`crate::application::services::StatsService::record_click`]
//! 4. The store appends the event and bumps the counter in one atomic step

pub mod click_job;
pub mod click_worker;
pub mod entities;
pub mod repositories;
pub mod stats;
