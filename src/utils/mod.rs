//! Helper functions used across the application.
//!
//! - [`code_generator`] - Short code generation and custom slug validation
//! - [`url_validator`] - Destination URL validation
//! - [`client_context`] - Client IP and user agent classification for clicks

pub mod client_context;
pub mod code_generator;
pub mod url_validator;
