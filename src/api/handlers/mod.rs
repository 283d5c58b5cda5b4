//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod links;
pub mod redirect;
pub mod stats;

pub use health::health_handler;
pub use links::{
    create_link_handler, delete_link_handler, disable_link_handler, enable_link_handler,
    get_link_handler, list_links_handler, track_click_handler, update_link_handler,
};
pub use redirect::redirect_handler;
pub use stats::stats_handler;
