mod common;

use blogd::config::SiteConfig;
use blogd::mail::{MemoryMailer, OutgoingMail};
use blogd::proto::http::Request;
use blogd::router::handle;
use common::{body, get, site, site_with};
use serde_json::Value;

#[test]
fn health_ready_returns_200_and_json() {
    let site = site();
    let resp = get(&site, "/health/ready");
    assert_eq!(resp.code.as_u16(), 200);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    assert_eq!(body(&resp), "{\"status\":\"ready\"}");
}

#[test]
fn unknown_path_renders_404_page() {
    let site = site();
    let resp = get(&site, "/nope/");
    assert_eq!(resp.code.as_u16(), 404);
    assert!(body(&resp).contains("<title>Page not found</title>"));
}

#[test]
fn wrong_method_is_405() {
    let site = site();
    let resp = get(&site, "/blog/1/comment/");
    assert_eq!(resp.code.as_u16(), 405);
    assert_eq!(resp.header("allow"), Some("POST"));

    let resp = handle(&site, Request::post_form("/blog/", &[])).unwrap();
    assert_eq!(resp.code.as_u16(), 405);
    assert_eq!(resp.header("allow"), Some("GET"));
}

#[test]
fn list_paginates_three_per_page() {
    let site = site();
    let first = body(&get(&site, "/blog/"));
    assert!(first.contains("<span class=\"current\">Page 1 of 2.</span>"));
    assert!(first.contains("<a href=\"?page=2\">Next</a>"));
    assert!(first.contains("<h2><a href=\"/blog/2024/1/9/gardening/\">Gardening</a></h2>"));
    assert!(!first.contains("Django draft"));

    let second = body(&get(&site, "/blog/?page=2"));
    assert!(second.contains("Page 2 of 2."));
    assert!(second.contains("<h2><a href=\"/blog/2024/1/5/learning-django/\">Learning Django</a></h2>"));
    assert!(second.contains("<a href=\"?page=1\">Previous</a>"));

    assert!(body(&get(&site, "/blog/?page=abc")).contains("Page 1 of 2."));
    assert!(body(&get(&site, "/blog/?page=99")).contains("Page 2 of 2."));
}

#[test]
fn list_excerpts_and_tags() {
    let site = site();
    let html = body(&get(&site, "/blog/?page=2"));
    assert!(html.contains(
        "<p class=\"tags\">Tags: <a href=\"/blog/tag/django/\">django</a>, <a href=\"/blog/tag/web/\">web</a></p>"
    ));
    assert!(html.contains("<p class=\"date\">Published Jan. 5, 2024, 10 a.m. by admin</p>"));
}

#[test]
fn tag_filter_lists_tagged_posts_only() {
    let site = site();
    let html = body(&get(&site, "/blog/tag/web/"));
    assert!(html.contains("<h2>Posts tagged with \"web\"</h2>"));
    assert!(html.contains("Rust for web</a></h2>"));
    assert!(html.contains("Learning Django</a></h2>"));
    assert!(!html.contains("Gardening</a></h2>"));

    assert_eq!(get(&site, "/blog/tag/unknown/").code.as_u16(), 404);
}

#[test]
fn detail_shows_comments_form_and_similar_posts() {
    let site = site();
    let resp = get(&site, "/blog/2024/1/5/learning-django/");
    assert_eq!(resp.code.as_u16(), 200);
    let html = body(&resp);
    assert!(html.contains("<title>Learning Django</title>"));
    assert!(html.contains("<h2>1 comment</h2>"));
    assert!(html.contains("Comment 1 by Ann"));
    assert!(html.contains("<p>Great intro.</p>"));
    assert!(html.contains("<form action=\"/blog/1/comment/\" method=\"post\">"));
    assert!(html.contains("<h2>Similar posts</h2>\n<p><a href=\"/blog/2024/1/7/rust-for-web/\">"));
    assert!(html.contains("<p><a href=\"/blog/2024/1/6/django-orm-tips/\">Django ORM tips</a></p>"));
}

#[test]
fn detail_misses_are_404() {
    let site = site();
    assert_eq!(get(&site, "/blog/2024/1/6/learning-django/").code.as_u16(), 404);
    assert_eq!(get(&site, "/blog/2024/1/8/django-draft/").code.as_u16(), 404);
}

#[test]
fn comment_is_added_and_shown() {
    let site = site();
    let req = Request::post_form(
        "/blog/3/comment/",
        &[("name", "Bob"), ("email", "bob@example.com"), ("body", "Nice\nwork")],
    );
    let resp = handle(&site, req).unwrap();
    assert_eq!(resp.code.as_u16(), 200);
    let html = body(&resp);
    assert!(html.contains("<h2>Your comment has been added.</h2>"));
    assert!(html.contains("<a href=\"/blog/2024/1/7/rust-for-web/\">Back to the post</a>"));

    let detail = body(&get(&site, "/blog/2024/1/7/rust-for-web/"));
    assert!(detail.contains("<h2>1 comment</h2>"));
    assert!(detail.contains("<p>Nice<br>work</p>"));
}

#[test]
fn invalid_comment_re_renders_the_form() {
    let site = site();
    let req = Request::post_form("/blog/3/comment/", &[("name", "Bob"), ("email", "bob")]);
    let html = body(&handle(&site, req).unwrap());
    assert!(!html.contains("Your comment has been added."));
    assert!(html.contains("<li>Enter a valid email address.</li>"));
    assert!(html.contains("value=\"Bob\""));

    let missing = handle(&site, Request::post_form("/blog/4/comment/", &[])).unwrap();
    assert_eq!(missing.code.as_u16(), 404);
}

#[test]
fn api_search_returns_json() {
    let site = site();
    let resp = get(&site, "/api/search?query=django");
    assert_eq!(resp.code.as_u16(), 200);
    let v: Value = serde_json::from_slice(&resp.body).expect("valid json");
    assert_eq!(v["query"], "django");
    assert_eq!(v["total"], 2);
    assert_eq!(v["results"][0]["id"], 2);
    assert_eq!(v["results"][0]["url"], "/blog/2024/1/6/django-orm-tips/");
    assert!(v["results"][0]["score"].as_f64().unwrap() > 0.1);

    // served from cache the second time
    let again = get(&site, "/api/search?query=DJANGO");
    let v2: Value = serde_json::from_slice(&again.body).unwrap();
    assert_eq!(v2["query"], "django");
}

#[test]
fn api_search_without_query_is_400() {
    let site = site();
    assert_eq!(get(&site, "/api/search").code.as_u16(), 400);
    assert_eq!(get(&site, "/api/search?query=%20").code.as_u16(), 400);
}

#[test]
fn sitemap_lists_published_posts() {
    let site = site();
    let resp = get(&site, "/sitemap.xml");
    assert_eq!(resp.header("content-type"), Some("application/xml"));
    let xml = body(&resp);
    assert_eq!(xml.matches("<url>").count(), 4);
    assert!(xml.contains("<loc>http://127.0.0.1:8000/blog/2024/1/5/learning-django/</loc>"));
    assert!(xml.contains("<lastmod>2024-01-05</lastmod>"));
}

#[test]
fn static_files_are_served_and_traversal_rejected() {
    let site = site();
    let css = get(&site, "/static/css/blog.css");
    assert_eq!(css.code.as_u16(), 200);
    assert_eq!(css.header("content-type"), Some("text/css"));
    assert_eq!(get(&site, "/static/../Cargo.toml").code.as_u16(), 400);
    assert_eq!(get(&site, "/static/missing.css").code.as_u16(), 404);
}

#[test]
fn share_page_shows_the_email_form() {
    let site = site();
    let resp = get(&site, "/blog/3/share/");
    assert_eq!(resp.code.as_u16(), 200);
    let html = body(&resp);
    assert!(html.contains("<title>Share a post</title>"));
    assert!(html.contains("<h1>Share \"Rust for web\" by e-mail</h1>"));
    assert!(html.contains("<input type=\"text\" name=\"name\" maxlength=\"25\" required id=\"id_name\">"));
    assert!(html.contains("<input type=\"email\" name=\"to\""));
    assert!(html.contains("<input type=\"submit\" value=\"Send e-mail\">"));

    let detail = body(&get(&site, "/blog/2024/1/7/rust-for-web/"));
    assert!(detail.contains("<a href=\"/blog/3/share/\">Share this post</a>"));
    assert_eq!(get(&site, "/blog/4/share/").code.as_u16(), 404);
}

#[test]
fn valid_share_sends_one_mail() {
    let mailer = MemoryMailer::default();
    let site = site_with(SiteConfig {
        site_url: "https://blog.example.com".into(),
        ..SiteConfig::default()
    })
    .with_mailer(Box::new(mailer.clone()));
    let req = Request::post_form(
        "/blog/3/share/",
        &[
            ("name", "Ann"),
            ("email", "ann@example.com"),
            ("to", "bob@example.com"),
            ("comments", "Worth a look"),
        ],
    );
    let resp = handle(&site, req).unwrap();
    assert_eq!(resp.code.as_u16(), 200);
    let html = body(&resp);
    assert!(html.contains("<h1>E-mail successfully sent</h1>"));
    assert!(html.contains("<p>\"Rust for web\" was successfully sent to bob@example.com.</p>"));
    assert_eq!(
        mailer.outbox(),
        vec![OutgoingMail {
            to: "bob@example.com".into(),
            subject: "Ann (ann@example.com) recommends you read Rust for web".into(),
            body: "Read Rust for web at https://blog.example.com/blog/2024/1/7/rust-for-web/\n\n\
                   Ann's comments: Worth a look"
                .into(),
        }]
    );
}

#[test]
fn invalid_share_re_renders_without_sending() {
    let mailer = MemoryMailer::default();
    let site = site().with_mailer(Box::new(mailer.clone()));
    let long = "n".repeat(26);
    let req = Request::post_form(
        "/blog/3/share/",
        &[("name", long.as_str()), ("email", "ann@example.com"), ("to", "bob")],
    );
    let html = body(&handle(&site, req).unwrap());
    assert!(!html.contains("successfully sent"));
    assert!(html.contains("<li>Ensure this value has at most 25 characters (it has 26).</li>"));
    assert!(html.contains("<li>Enter a valid email address.</li>"));
    assert!(html.contains("value=\"ann@example.com\""));
    assert!(mailer.outbox().is_empty());
}

#[test]
fn share_accepts_only_get_and_post() {
    let site = site();
    let req = Request {
        method: "PUT".into(),
        path: "/blog/3/share/".into(),
        headers: vec![],
        body: vec![],
    };
    let resp = handle(&site, req).unwrap();
    assert_eq!(resp.code.as_u16(), 405);
    assert_eq!(resp.header("allow"), Some("GET, POST"));
}
