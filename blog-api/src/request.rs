use memchr::memchr;

use crate::{limits::enforce_max_message_size, status::StatusCode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub version: String,
}

/// Parse the start-line of an HTTP/1.x message, enforcing the message size limit.
/// Expected format: "GET /blog/search/?query=x HTTP/1.1\r\n...".
/// Returns a StatusCode error (400, 413) on violations.
pub fn parse_request_line(raw: &[u8]) -> Result<RequestLine, StatusCode> {
    if enforce_max_message_size(raw.len()).is_err() {
        return Err(StatusCode::RequestEntityTooLarge);
    }
    let end = memchr(b'\n', raw).unwrap_or(raw.len());
    let line = std::str::from_utf8(&raw[..end]).map_err(|_| StatusCode::BadRequest)?;
    let line = line.trim_end_matches('\r');

    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");
    let version = parts.next().unwrap_or("HTTP/1.0");
    if method.is_empty() || path.is_empty() || !path.starts_with('/') {
        return Err(StatusCode::BadRequest);
    }
    if !version.starts_with("HTTP/1.") {
        return Err(StatusCode::BadRequest);
    }
    Ok(RequestLine {
        method: method.to_ascii_uppercase(),
        path: path.to_string(),
        version: version.to_string(),
    })
}
