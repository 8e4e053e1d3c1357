//! Request handler module
//!
//! Method dispatch, static file serving and the hook points a serving policy
//! plugs into.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
pub use static_files::{PlainHooks, ServeHooks};
