mod common;

use blogd::proto::http::{make_empty_response, read_request};
use blogd::router::handle;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

async fn roundtrip(raw: &[u8]) -> String {
    let (mut client, mut server) = duplex(64 * 1024);
    let srv = tokio::spawn(async move {
        let site = common::site();
        let bytes = match read_request(&mut server).await {
            Ok(req) => handle(&site, req).expect("router").into_bytes(),
            Err(code) => make_empty_response(code),
        };
        server.write_all(&bytes).await.unwrap();
        server.shutdown().await.unwrap();
    });
    client.write_all(raw).await.unwrap();
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    srv.await.unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn search_page_over_the_wire() {
    let resp = roundtrip(b"GET /blog/search/?query=django HTTP/1.1\r\nhost: localhost\r\n\r\n").await;
    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"), "response was: {resp}");
    assert!(resp.contains("\r\ncontent-type: text/html; charset=utf-8\r\n"));
    assert!(resp.contains("\r\nconnection: close\r\n"));
    assert!(resp.contains("Found 2 results"));
}

#[tokio::test]
async fn malformed_request_line_is_400() {
    let resp = roundtrip(b"GET nope HTTP/1.1\r\n\r\n").await;
    assert!(resp.starts_with("HTTP/1.1 400 Bad Request\r\n"), "response was: {resp}");
}
