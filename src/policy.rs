//! Development request policy
//!
//! Layered on top of the generic file server through `ServeHooks`:
//! - MIME overrides for WebAssembly and JavaScript modules
//! - permissive CORS headers on every response
//! - OPTIONS preflight answered without touching the filesystem

use crate::handler::ServeHooks;
use crate::http::{self, mime, ContentType};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use hyper::{HeaderMap, Response};

/// Content-type overrides, checked in order before the baseline guess is kept.
/// Matched against the literal end of the path.
pub const MIME_OVERRIDES: &[(&str, &str)] = &[
    (".wasm", "application/wasm"),
    (".js", "text/javascript"),
    (".mjs", "text/javascript"),
];

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

/// Resolve the content type of `path`: baseline guess, then overrides.
/// The baseline encoding is kept as is.
///
/// # Examples
/// ```
/// use wasm_devserve::policy::resolve_content_type;
/// assert_eq!(resolve_content_type("pkg/app_bg.wasm").mime_type, Some("application/wasm"));
/// assert_eq!(resolve_content_type("main.mjs").mime_type, Some("text/javascript"));
/// assert_eq!(resolve_content_type("style.css").mime_type, Some("text/css"));
/// ```
pub fn resolve_content_type(path: &str) -> ContentType {
    let baseline = mime::guess(path);
    MIME_OVERRIDES
        .iter()
        .find(|(suffix, _)| path.ends_with(suffix))
        .map_or(baseline, |(_, mime_type)| ContentType {
            mime_type: Some(*mime_type),
            ..baseline
        })
}

/// Add the CORS headers. Existing values are replaced.
pub fn finalize_headers(headers: &mut HeaderMap) {
    headers.insert(
        ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static(ALLOW_ORIGIN),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
}

/// Preflight reply: 200, empty body, CORS headers
pub fn handle_options() -> Response<Full<Bytes>> {
    let mut response = http::build_options_response();
    finalize_headers(response.headers_mut());
    response
}

/// `ServeHooks` implementation for local development
#[derive(Debug, Default, Clone, Copy)]
pub struct DevPolicy;

impl ServeHooks for DevPolicy {
    fn content_type(&self, path: &str) -> ContentType {
        resolve_content_type(path)
    }

    fn finalize_headers(&self, headers: &mut HeaderMap) {
        finalize_headers(headers);
    }

    fn handle_options(&self, _path: &str) -> Option<Response<Full<Bytes>>> {
        Some(handle_options())
    }
}
