//! Static file serving module
//!
//! Generic file server: translates request paths onto the served root and
//! builds file, listing, redirect and error responses. Content-type and header
//! decisions are delegated to a `ServeHooks` implementation.

use crate::config::HttpConfig;
use crate::http::{self, listing, mime, ContentType};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{HeaderMap, Response};
use percent_encoding::percent_decode_str;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Extension points of the file server
pub trait ServeHooks: Send + Sync {
    /// Content type for the file about to be served
    fn content_type(&self, path: &str) -> ContentType;

    /// Called on every response after status and common headers are set
    fn finalize_headers(&self, headers: &mut HeaderMap);

    /// Reply to an OPTIONS request, or `None` to treat it as unsupported
    fn handle_options(&self, _path: &str) -> Option<Response<Full<Bytes>>> {
        None
    }
}

/// Hooks with default behavior: baseline MIME guess, no extra headers
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHooks;

impl ServeHooks for PlainHooks {
    fn content_type(&self, path: &str) -> ContentType {
        mime::guess(path)
    }

    fn finalize_headers(&self, _headers: &mut HeaderMap) {}
}

/// Request information needed by the file server
pub struct RequestContext<'a> {
    /// Raw (still percent-encoded) URL path
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
}

/// Serve a GET/HEAD request from `root`
pub async fn serve(
    ctx: &RequestContext<'_>,
    root: &Path,
    http_config: &HttpConfig,
    hooks: &dyn ServeHooks,
) -> Response<Full<Bytes>> {
    let fs_path = translate_path(root, ctx.path);

    let Some(canonical) = resolve_inside(root, &fs_path, ctx.path).await else {
        return http::build_404_response();
    };

    if fs::metadata(&canonical).await.is_ok_and(|m| m.is_dir()) {
        return serve_directory(ctx, root, &fs_path, &canonical, http_config, hooks).await;
    }

    if ctx.path.ends_with('/') {
        return http::build_404_response();
    }

    serve_file(&canonical, &fs_path, ctx.is_head, hooks).await
}

/// Canonicalize `fs_path` and require it to stay below `root`.
/// Missing files and links escaping the root look the same to the client.
async fn resolve_inside(root: &Path, fs_path: &Path, url_path: &str) -> Option<PathBuf> {
    let canonical = fs::canonicalize(fs_path).await.ok()?;
    if !canonical.starts_with(root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {url_path} -> {}",
            canonical.display()
        ));
        return None;
    }
    Some(canonical)
}

async fn serve_directory(
    ctx: &RequestContext<'_>,
    root: &Path,
    fs_dir: &Path,
    dir: &Path,
    http_config: &HttpConfig,
    hooks: &dyn ServeHooks,
) -> Response<Full<Bytes>> {
    if !ctx.path.ends_with('/') {
        let location = match ctx.query {
            Some(q) => format!("{}/?{q}", ctx.path),
            None => format!("{}/", ctx.path),
        };
        return http::build_301_response(&location);
    }

    for index_file in &http_config.index_files {
        let index_path = fs_dir.join(index_file);
        let Some(canonical) = resolve_inside(root, &index_path, ctx.path).await else {
            continue;
        };
        if fs::metadata(&canonical).await.is_ok_and(|m| m.is_file()) {
            return serve_file(&canonical, &index_path, ctx.is_head, hooks).await;
        }
    }

    if !http_config.directory_listing {
        return http::build_404_response();
    }

    let display_path = percent_decode_str(ctx.path).decode_utf8_lossy();
    match listing::render_directory(dir, &display_path).await {
        Ok(html) => http::build_html_response(html, ctx.is_head),
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to list directory '{}': {e}",
                dir.display()
            ));
            http::build_403_response("No permission to list directory")
        }
    }
}

/// Read `file_path` and reply with it. The content type is decided on
/// `served_path`, the path as requested, not where a symlink leads.
async fn serve_file(
    file_path: &Path,
    served_path: &Path,
    is_head: bool,
    hooks: &dyn ServeHooks,
) -> Response<Full<Bytes>> {
    let content = match fs::read(file_path).await {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                logger::log_warning(&format!(
                    "Failed to read file '{}': {e}",
                    file_path.display()
                ));
            }
            return http::build_404_response();
        }
    };

    let content_type = hooks.content_type(&served_path.to_string_lossy());
    http::build_file_response(Bytes::from(content), content_type.header_value(), is_head)
}

/// Map a URL path onto the filesystem below `root`.
///
/// The path is percent-decoded and split on `/`; empty, `.` and `..`
/// segments are dropped so the result never climbs above `root`.
pub fn translate_path(root: &Path, url_path: &str) -> PathBuf {
    let decoded = percent_decode_str(url_path).decode_utf8_lossy();
    decoded
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
