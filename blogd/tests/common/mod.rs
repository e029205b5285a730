#![allow(dead_code)]

use blogd::catalog::Catalog;
use blogd::config::SiteConfig;
use blogd::index::make_engine;
use blogd::models::{Comment, Post, Status, Tag};
use blogd::proto::http::{Request, Response};
use blogd::router::handle;
use blogd::site::Site;
use chrono::{TimeZone, Utc};

/// Twenty words, one of them bold.
pub const LONG_BODY: &str =
    "w1 **w2** w3 w4 w5 w6 w7 w8 w9 w10 w11 w12 w13 w14 w15 w16 w17 w18 w19 w20";

pub fn post(id: i64, title: &str, slug: &str, day: u32, status: Status, tags: &[&str], body: &str) -> Post {
    let at = Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap();
    Post {
        id,
        title: title.into(),
        slug: slug.into(),
        author: "admin".into(),
        body: body.into(),
        publish: at,
        created: at,
        updated: at,
        status,
        tags: tags.iter().map(|t| Tag::new(t)).collect(),
    }
}

pub fn posts() -> Vec<Post> {
    vec![
        post(1, "Learning Django", "learning-django", 5, Status::Published, &["django", "web"], LONG_BODY),
        post(2, "Django ORM tips", "django-orm-tips", 6, Status::Published, &["django"], "Short *body*."),
        post(3, "Rust for web", "rust-for-web", 7, Status::Published, &["rust", "web"], "Fast."),
        post(4, "Django draft", "django-draft", 8, Status::Draft, &["django"], "Not yet."),
        post(5, "Gardening", "gardening", 9, Status::Published, &["garden"], "Dig."),
    ]
}

pub fn comments() -> Vec<Comment> {
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 8, 0, 0).unwrap();
    vec![Comment {
        id: 1,
        post_id: 1,
        name: "Ann".into(),
        email: "ann@example.com".into(),
        body: "Great intro.".into(),
        created: at,
        updated: at,
        active: true,
    }]
}

pub fn site() -> Site {
    site_with(SiteConfig::default())
}

pub fn site_with(cfg: SiteConfig) -> Site {
    let engine = make_engine(&cfg.search_engine).expect("engine");
    Site::new(cfg, Catalog::new(posts(), comments()), engine, None).expect("site")
}

pub fn get(site: &Site, path: &str) -> Response {
    handle(site, Request::get(path)).expect("router should handle")
}

pub fn body(resp: &Response) -> String {
    resp.text().into_owned()
}
