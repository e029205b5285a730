use std::path::{Path, PathBuf};

use anyhow::Result;
use blog_api::status::StatusCode;
use tracing::debug;

use crate::proto::http::Response;
use crate::site::Site;

/// Configured directory, else `static/` next to the crate, the working
/// directory or the executable.
pub fn static_dir(configured: Option<&Path>) -> PathBuf {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = configured {
        candidates.push(dir.to_path_buf());
    }
    candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"));
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("static"));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join("static"));
        }
    }
    candidates
        .into_iter()
        .find(|p| p.is_dir())
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"))
}

pub fn serve(site: &Site, rel: &str) -> Result<Response> {
    if rel.is_empty() || rel.contains("..") || rel.starts_with('/') {
        return Ok(Response::empty(StatusCode::BadRequest));
    }
    let p = static_dir(site.config().static_dir.as_deref()).join(rel);
    match std::fs::read(&p) {
        Ok(bytes) => Ok(Response {
            code: StatusCode::Ok,
            headers: vec![("content-type".into(), content_type_for(&p).into())],
            body: bytes,
        }),
        Err(e) => {
            debug!(target: "blogd::assets", path = %p.display(), "static file missing: {e}");
            Ok(Response::empty(StatusCode::NotFound))
        }
    }
}

fn content_type_for(p: &Path) -> &'static str {
    match p
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
        .as_str()
    {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
