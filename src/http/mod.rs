//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! development policy applied on top of it.

pub mod listing;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use mime::ContentType;
pub use response::{
    build_301_response, build_403_response, build_404_response, build_501_response,
    build_file_response, build_html_response, build_options_response,
};
