//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method dispatch, header
//! finalization and access logging.

use crate::config::AppState;
use crate::handler::static_files::{self, RequestContext};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue, REFERER, SERVER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling.
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();
    let method = &parts.method;
    let uri = &parts.uri;

    let mut response = match *method {
        Method::GET | Method::HEAD => {
            let ctx = RequestContext {
                path: uri.path(),
                query: uri.query(),
                is_head: *method == Method::HEAD,
            };
            static_files::serve(&ctx, &state.root, &state.config.http, state.hooks.as_ref()).await
        }
        Method::OPTIONS => state
            .hooks
            .handle_options(uri.path())
            .unwrap_or_else(|| http::build_501_response(method.as_str())),
        _ => {
            logger::log_warning(&format!("Unsupported method: {method} {}", uri.path()));
            http::build_501_response(method.as_str())
        }
    };

    finalize_response(&mut response, &state);

    if state.config.logging.access_log {
        let entry = access_entry(&parts, &response, peer_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Common headers, then the policy's finalization hook. Runs for every
/// response whatever its status.
fn finalize_response(response: &mut Response<Full<Bytes>>, state: &AppState) {
    let headers = response.headers_mut();
    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        headers.insert(SERVER, server);
    }
    state.hooks.finalize_headers(headers);
}

fn access_entry(
    req: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: Option<SocketAddr>,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = match req.version {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::handler::PlainHooks;
    use crate::policy::DevPolicy;
    use http_body_util::BodyExt;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        CONTENT_TYPE,
    };
    use hyper::HeaderMap;

    fn state_with(hooks: impl crate::handler::ServeHooks + 'static) -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        std::fs::write(root.join("module.mjs"), "export const x = 1;").unwrap();
        std::fs::write(root.join("app.wasm"), b"\0asm\x01\0\0\0").unwrap();
        std::fs::write(root.join("main.js"), "import('./module.mjs');").unwrap();
        std::fs::write(root.join("style.css"), "body {}").unwrap();

        let mut config = Config::defaults().unwrap();
        config.logging.access_log = false;
        (dir, Arc::new(AppState::new(config, root, hooks)))
    }

    fn dev_state() -> (tempfile::TempDir, Arc<AppState>) {
        state_with(DevPolicy)
    }

    async fn send(state: &Arc<AppState>, method: &str, path: &str) -> Response<Full<Bytes>> {
        let req = Request::builder().method(method).uri(path).body(()).unwrap();
        handle_request(req, Arc::clone(state), None).await.unwrap()
    }

    fn assert_cors(headers: &HeaderMap) {
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, OPTIONS");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }

    #[tokio::test]
    async fn test_get_module_mjs() {
        let (_dir, state) = dev_state();
        let resp = send(&state, "GET", "/module.mjs").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/javascript");
        assert_cors(resp.headers());
    }

    #[tokio::test]
    async fn test_get_wasm() {
        let (_dir, state) = dev_state();
        let resp = send(&state, "GET", "/app.wasm").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/wasm");
        assert_cors(resp.headers());
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..4], b"\0asm");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_wasm_symlink_to_other_name() {
        let (_dir, state) = dev_state();
        std::fs::write(state.root.join("app_bg.bin"), b"\0asm\x01\0\0\0").unwrap();
        std::fs::create_dir(state.root.join("pkg")).unwrap();
        std::os::unix::fs::symlink(
            state.root.join("app_bg.bin"),
            state.root.join("pkg").join("linked.wasm"),
        )
        .unwrap();

        let resp = send(&state, "GET", "/pkg/linked.wasm").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/wasm");
        assert_cors(resp.headers());
    }

    #[tokio::test]
    async fn test_get_js_and_other_types() {
        let (_dir, state) = dev_state();
        let resp = send(&state, "GET", "/main.js").await;
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/javascript");

        let resp = send(&state, "GET", "/style.css").await;
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/css");
    }

    #[tokio::test]
    async fn test_missing_file_keeps_cors() {
        let (_dir, state) = dev_state();
        let resp = send(&state, "GET", "/missing.txt").await;
        assert_eq!(resp.status(), 404);
        assert_cors(resp.headers());
    }

    #[tokio::test]
    async fn test_options_any_path() {
        let (_dir, state) = dev_state();
        let resp = send(&state, "OPTIONS", "/anything/that/does/not/exist").await;
        assert_eq!(resp.status(), 200);
        assert_cors(resp.headers());
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_method_is_501_with_cors() {
        let (_dir, state) = dev_state();
        for method in ["POST", "PUT", "DELETE"] {
            let resp = send(&state, method, "/app.wasm").await;
            assert_eq!(resp.status(), 501, "method: {method}");
            assert_cors(resp.headers());
        }
    }

    #[tokio::test]
    async fn test_redirect_and_head_keep_cors() {
        let (_dir, state) = dev_state();
        std::fs::create_dir(state.root.join("pkg")).unwrap();

        let resp = send(&state, "GET", "/pkg").await;
        assert_eq!(resp.status(), 301);
        assert_cors(resp.headers());

        let resp = send(&state, "HEAD", "/app.wasm").await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/wasm");
        assert_cors(resp.headers());
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_server_header() {
        let (_dir, state) = dev_state();
        let resp = send(&state, "GET", "/missing.txt").await;
        assert_eq!(
            resp.headers()[SERVER].to_str().unwrap(),
            state.config.http.server_name
        );
    }

    #[tokio::test]
    async fn test_plain_hooks_have_no_policy() {
        let (_dir, state) = state_with(PlainHooks);

        let resp = send(&state, "OPTIONS", "/anything").await;
        assert_eq!(resp.status(), 501);
        assert!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        let resp = send(&state, "GET", "/app.wasm").await;
        assert_eq!(resp.status(), 200);
        assert!(resp.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_access_entry() {
        let req = Request::builder()
            .method("GET")
            .uri("/app.wasm?v=1")
            .header(USER_AGENT, "curl/8.0")
            .body(())
            .unwrap();
        let resp = http::build_file_response(Bytes::from_static(b"abc"), "application/wasm", false);
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();

        let (parts, ()) = req.into_parts();
        let entry = access_entry(&parts, &resp, Some(peer), Instant::now());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.path, "/app.wasm");
        assert_eq!(entry.query.as_deref(), Some("v=1"));
        assert_eq!(entry.status, 200);
        assert_eq!(entry.body_bytes, 3);
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert!(entry.referer.is_none());
    }
}
