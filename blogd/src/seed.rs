//! JSON seed file used when no database is configured.
//!
//! ```json
//! {
//!   "posts": [{"id": 1, "title": "Hello", "body": "**hi**", "publish": "2024-01-05T10:00:00Z",
//!              "status": "PB", "tags": ["Rust"]}],
//!   "comments": [{"post_id": 1, "name": "Ann", "email": "ann@example.com", "body": "Nice"}]
//! }
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::catalog::Catalog;
use crate::models::{slugify, Comment, Post, Status, Tag};

#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    posts: Vec<SeedPost>,
    #[serde(default)]
    comments: Vec<SeedComment>,
}

#[derive(Debug, Deserialize)]
struct SeedPost {
    id: i64,
    title: String,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default = "default_author")]
    author: String,
    #[serde(default)]
    body: String,
    publish: DateTime<Utc>,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SeedComment {
    #[serde(default)]
    id: Option<i64>,
    post_id: i64,
    name: String,
    email: String,
    body: String,
    #[serde(default)]
    created: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_author() -> String {
    "admin".to_string()
}

fn default_status() -> String {
    Status::Published.code().to_string()
}

fn default_active() -> bool {
    true
}

pub fn parse(json: &str) -> Result<Catalog> {
    let seed: SeedFile = serde_json::from_str(json).context("invalid seed json")?;
    let mut posts = Vec::with_capacity(seed.posts.len());
    for p in seed.posts {
        let Some(status) = Status::from_code(&p.status) else {
            bail!("post {}: unknown status {:?}", p.id, p.status);
        };
        let slug = p.slug.unwrap_or_else(|| slugify(&p.title));
        let created = p.created.unwrap_or(p.publish);
        posts.push(Post {
            id: p.id,
            slug,
            author: p.author,
            body: p.body,
            publish: p.publish,
            created,
            updated: p.updated.unwrap_or(created),
            status,
            tags: p.tags.iter().map(|t| Tag::new(t)).collect(),
            title: p.title,
        });
    }
    let now = Utc::now();
    let comments = seed
        .comments
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let created = c.created.unwrap_or(now);
            Comment {
                id: c.id.unwrap_or(i as i64 + 1),
                post_id: c.post_id,
                name: c.name,
                email: c.email,
                body: c.body,
                created,
                updated: created,
                active: c.active,
            }
        })
        .collect();
    Ok(Catalog::new(posts, comments))
}

pub fn load(path: &Path) -> Result<Catalog> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading seed file {}", path.display()))?;
    parse(&text).with_context(|| format!("loading seed file {}", path.display()))
}
