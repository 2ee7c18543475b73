//! Render host: an ephemeral loopback static file server
//!
//! Headless Chrome cannot run the renderer from a `data:` URL without losing
//! same-origin script access, so the pipeline exposes the template page and
//! any static assets over a short-lived HTTP server bound to an OS-assigned
//! port. The server lives on a background thread owned by [`RenderHost`] and
//! is shut down when the host is dropped.

use crate::error::{Error, Result};
use log::{debug, info};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tiny_http::{Header, Request, Response, Server};

/// Template page compiled into the binary; used whenever the asset directory
/// does not provide its own `template.html`.
const TEMPLATE: &str = include_str!("../assets/template.html");

/// An ephemeral static file server for the headless renderer.
pub struct RenderHost {
    server: Arc<Server>,
    port: u16,
    handle: Option<thread::JoinHandle<()>>,
}

impl RenderHost {
    /// Bind to `127.0.0.1:0` and start serving on a background thread.
    ///
    /// `asset_dir` optionally points at a directory of static files; its
    /// `template.html` overrides the embedded template page.
    pub fn start(asset_dir: Option<PathBuf>) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|e| Error::Server(format!("failed to bind loopback listener: {e}")))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| Error::Server("listener has no IP address".into()))?;

        let template = load_template(asset_dir.as_deref());
        let server = Arc::new(server);
        let accept = Arc::clone(&server);
        let handle = thread::spawn(move || {
            for request in accept.incoming_requests() {
                respond(request, &template, asset_dir.as_deref());
            }
        });

        info!("render host listening on 127.0.0.1:{port}");
        Ok(Self {
            server,
            port,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Root URL of the template page.
    pub fn url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.port)
    }
}

impl Drop for RenderHost {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn respond(request: Request, template: &str, asset_dir: Option<&Path>) {
    let raw_url = request.url().to_string();
    debug!("render host: GET {raw_url}");

    if request_path(&raw_url) == "/" {
        let response =
            Response::from_string(template).with_header(content_type_header("text/html; charset=utf-8"));
        let _ = request.respond(response);
        return;
    }

    let body = asset_dir
        .and_then(|dir| resolve_asset(dir, &raw_url))
        .and_then(|path| std::fs::read(&path).ok().map(|data| (path, data)));

    match body {
        Some((path, data)) => {
            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let response = Response::from_data(data).with_header(content_type_header(content_type(ext)));
            let _ = request.respond(response);
        }
        None => {
            let _ = request.respond(Response::from_string("Not found").with_status_code(404));
        }
    }
}

fn content_type_header(value: &str) -> Header {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).expect("static header value")
}

/// Fixed extension-to-MIME table; anything unknown is served as binary.
fn content_type(ext: &str) -> &'static str {
    match ext {
        "html" => "text/html; charset=utf-8",
        "js" => "application/javascript",
        "css" => "text/css",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        _ => "application/octet-stream",
    }
}

fn request_path(raw_url: &str) -> &str {
    raw_url.split('?').next().unwrap_or(raw_url)
}

/// Map a request URL to a file beneath the asset directory.
///
/// Rejects anything that is not a plain relative path (absolute paths,
/// `..` components) so the server cannot be walked out of its directory.
fn resolve_asset(asset_dir: &Path, raw_url: &str) -> Option<PathBuf> {
    let rel = request_path(raw_url).trim_start_matches('/');
    if rel.is_empty() {
        return None;
    }
    let rel = Path::new(rel);
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(asset_dir.join(rel))
}

fn load_template(asset_dir: Option<&Path>) -> String {
    if let Some(dir) = asset_dir {
        let candidate = dir.join("template.html");
        if let Ok(text) = std::fs::read_to_string(&candidate) {
            debug!("using template from {}", candidate.display());
            return text;
        }
    }
    TEMPLATE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_table() {
        assert_eq!(content_type("html"), "text/html; charset=utf-8");
        assert_eq!(content_type("js"), "application/javascript");
        assert_eq!(content_type("css"), "text/css");
        assert_eq!(content_type("svg"), "image/svg+xml");
        assert_eq!(content_type("woff2"), "application/octet-stream");
    }

    #[test]
    fn resolve_asset_joins_plain_paths() {
        let dir = Path::new("/srv/assets");
        assert_eq!(
            resolve_asset(dir, "/js/markmap.js"),
            Some(PathBuf::from("/srv/assets/js/markmap.js"))
        );
    }

    #[test]
    fn resolve_asset_strips_query_strings() {
        let dir = Path::new("/srv/assets");
        assert_eq!(
            resolve_asset(dir, "/style.css?v=3"),
            Some(PathBuf::from("/srv/assets/style.css"))
        );
    }

    #[test]
    fn resolve_asset_rejects_traversal() {
        let dir = Path::new("/srv/assets");
        assert_eq!(resolve_asset(dir, "/../secret"), None);
        assert_eq!(resolve_asset(dir, "/a/../../secret"), None);
        assert_eq!(resolve_asset(dir, "/"), None);
    }

    #[test]
    fn embedded_template_defines_render_entry_point() {
        assert!(TEMPLATE.contains("renderMindMap"));
        assert!(TEMPLATE.contains("svg") && TEMPLATE.contains("mindmap"));
    }
}
