use anyhow::Result;
use blog_api::{
    limits::{enforce_max_message_size, MAX_MESSAGE_BYTES},
    request::parse_request_line,
    status::StatusCode,
};
use memchr::{memchr, memmem::Finder};
use tokio::io::AsyncReadExt;

#[derive(Debug, Clone)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn get(path: &str) -> Self {
        Self {
            method: "GET".into(),
            path: path.into(),
            headers: vec![],
            body: vec![],
        }
    }

    /// A POST with an `application/x-www-form-urlencoded` body.
    pub fn post_form(path: &str, pairs: &[(&str, &str)]) -> Self {
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
            .collect::<Vec<_>>()
            .join("&");
        Self {
            method: "POST".into(),
            path: path.into(),
            headers: vec![(
                "content-type".into(),
                "application/x-www-form-urlencoded".into(),
            )],
            body: body.into_bytes(),
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.path.split_once('?').map(|(_, q)| q)
    }

    pub fn path_only(&self) -> &str {
        self.path.split('?').next().unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded query-string pairs, in order.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.query().map(parse_urlencoded).unwrap_or_default()
    }

    /// Decoded url-encoded body pairs; empty for other content types.
    pub fn form_params(&self) -> Vec<(String, String)> {
        let is_form = self
            .header("content-type")
            .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
            .unwrap_or(false);
        if !is_form {
            return Vec::new();
        }
        parse_urlencoded(&String::from_utf8_lossy(&self.body))
    }
}

/// Decode `a=1&b=two+words` into pairs. `+` means space; keys without `=` get an empty value.
pub fn parse_urlencoded(s: &str) -> Vec<(String, String)> {
    s.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(k), decode_component(v))
        })
        .collect()
}

pub fn decode_component(s: &str) -> String {
    let spaced = s.replace('+', " ");
    percent_encoding::percent_decode_str(&spaced)
        .decode_utf8_lossy()
        .to_string()
}

pub fn encode_component(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, percent_encoding::NON_ALPHANUMERIC).to_string()
}

pub async fn read_request<S>(stream: &mut S) -> Result<Request, StatusCode>
where
    S: AsyncReadExt + Unpin,
{
    // Read headers up to CRLFCRLF with total cap
    let mut buf = Vec::with_capacity(4096);
    let mut tmp = [0u8; 2048];
    let mut search_from: usize = 0;
    let finder = Finder::new(b"\r\n\r\n");
    let header_end = loop {
        let n = stream
            .read(&mut tmp)
            .await
            .map_err(|_| StatusCode::InternalServerError)?;
        if n == 0 {
            return Err(StatusCode::BadRequest);
        }
        buf.extend_from_slice(&tmp[..n]);
        if buf.len() > MAX_MESSAGE_BYTES {
            return Err(StatusCode::RequestEntityTooLarge);
        }
        // rescan only the new bytes, with overlap for a split terminator
        let start = search_from.saturating_sub(3);
        if let Some(rel) = finder.find(&buf[start..]) {
            break start + rel;
        }
        search_from = buf.len();
    };

    let (head, rest) = buf.split_at(header_end + 4);
    let line = parse_request_line(head)?;
    let head_str = std::str::from_utf8(head).map_err(|_| StatusCode::BadRequest)?;

    let mut headers = Vec::new();
    let mut content_length: usize = 0;
    for raw in head_str.split("\r\n").skip(1) {
        if raw.is_empty() {
            continue;
        }
        if let Some(idx) = memchr(b':', raw.as_bytes()) {
            let (name_raw, value_raw) = raw.split_at(idx);
            let name = name_raw.trim().to_ascii_lowercase();
            let value = value_raw[1..].trim().to_string();
            if name == "content-length" {
                content_length = value.parse::<usize>().map_err(|_| StatusCode::BadRequest)?;
            }
            headers.push((name, value));
        }
    }

    let mut body = Vec::new();
    if content_length > 0 {
        let total = (header_end + 4)
            .checked_add(content_length)
            .ok_or(StatusCode::RequestEntityTooLarge)?;
        enforce_max_message_size(total).map_err(|_| StatusCode::RequestEntityTooLarge)?;
        body.extend_from_slice(rest);
        while body.len() < content_length {
            let mut chunk = [0u8; 4096];
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|_| StatusCode::InternalServerError)?;
            if n == 0 {
                return Err(StatusCode::BadRequest);
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(content_length);
    }

    Ok(Request {
        method: line.method,
        path: line.path,
        headers,
        body,
    })
}

#[derive(Debug, Clone)]
pub struct Response {
    pub code: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn empty(code: StatusCode) -> Self {
        Self {
            code,
            headers: vec![],
            body: vec![],
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        make_response(self.code, &self.headers, &self.body)
    }
}

pub fn make_response(code: StatusCode, headers: &[(String, String)], body: &[u8]) -> Vec<u8> {
    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    let mut out = format!(
        "HTTP/1.1 {} {}\r\nserver: blogd\r\ndate: {}\r\nconnection: close\r\n",
        code.as_u16(),
        code.reason(),
        date
    )
    .into_bytes();
    let mut had_ct = false;
    let mut had_cl = false;
    for (k, v) in headers {
        if k.eq_ignore_ascii_case("content-type") {
            had_ct = true;
        }
        if k.eq_ignore_ascii_case("content-length") {
            had_cl = true;
        }
        out.extend_from_slice(k.as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(v.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    if !had_ct {
        out.extend_from_slice(b"content-type: text/plain; charset=utf-8\r\n");
    }
    if !had_cl {
        out.extend_from_slice(format!("content-length: {}\r\n", body.len()).as_bytes());
    }
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(body);
    out
}

pub fn make_empty_response(code: StatusCode) -> Vec<u8> {
    make_response(code, &[], &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencoded_pairs_decode_plus_and_percent() {
        let pairs = parse_urlencoded("query=learning+rust%21&page=2&flag");
        assert_eq!(
            pairs,
            vec![
                ("query".to_string(), "learning rust!".to_string()),
                ("page".to_string(), "2".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn post_form_round_trips_through_form_params() {
        let req = Request::post_form("/blog/1/comment/", &[("name", "Ada L"), ("body", "a&b=c")]);
        assert_eq!(
            req.form_params(),
            vec![
                ("name".to_string(), "Ada L".to_string()),
                ("body".to_string(), "a&b=c".to_string()),
            ]
        );
    }

    #[test]
    fn response_frame_has_status_line_and_length() {
        let bytes = make_response(
            StatusCode::NotFound,
            &[("content-type".into(), "text/html; charset=utf-8".into())],
            b"nope",
        );
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("content-length: 4\r\n"));
        assert!(text.ends_with("\r\n\r\nnope"));
        assert_eq!(text.matches("content-type").count(), 1);
    }
}
