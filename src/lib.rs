//! Local development static file server.
//!
//! Serves a directory over HTTP with permissive CORS headers and corrected
//! content types for WebAssembly and JavaScript modules.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod policy;
pub mod server;
