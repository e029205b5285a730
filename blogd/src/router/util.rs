use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use blog_api::status::StatusCode;

use crate::proto::http::{Request, Response};

pub fn percent_decode(s: &str) -> String {
    percent_encoding::percent_decode_str(s).decode_utf8_lossy().to_string()
}

pub fn json_response(code: StatusCode, body: Vec<u8>) -> Response {
    Response {
        code,
        headers: vec![("content-type".into(), "application/json".into())],
        body,
    }
}

pub fn html_response(code: StatusCode, html: String) -> Response {
    Response {
        code,
        headers: vec![("content-type".into(), "text/html; charset=utf-8".into())],
        body: html.into_bytes(),
    }
}

/// Peer address, else the first `x-forwarded-for` entry.
pub fn client_ip(req: &Request, peer: Option<SocketAddr>) -> Option<IpAddr> {
    peer.map(|p| p.ip()).or_else(|| {
        req.header("x-forwarded-for")
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok())
    })
}

/// Last value of `key`, the way a query dict's `get` behaves.
pub fn last_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_for_is_a_fallback() {
        let mut req = Request::get("/");
        req.headers.push(("X-Forwarded-For".into(), "10.1.2.3, 192.168.0.1".into()));
        assert_eq!(client_ip(&req, None), Some("10.1.2.3".parse().unwrap()));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(client_ip(&req, Some(peer)), Some(peer.ip()));
    }

    #[test]
    fn last_value_wins() {
        let params = vec![("page".to_string(), "1".to_string()), ("page".to_string(), "3".to_string())];
        assert_eq!(last_param(&params, "page"), Some("3"));
        assert_eq!(last_param(&params, "q"), None);
    }
}
