use blog_index::PostDocument;
use chrono::{DateTime, Datelike, Utc};
use tracing::warn;

use crate::urls::{reverse, POST_DETAIL};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Draft,
    Published,
}

impl Status {
    /// Two-letter code stored in the database.
    pub fn code(self) -> &'static str {
        match self {
            Status::Draft => "DF",
            Status::Published => "PB",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::Published => "Published",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "DF" => Some(Status::Draft),
            "PB" => Some(Status::Published),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub slug: String,
}

impl Tag {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            slug: slugify(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub author: String,
    pub body: String,
    pub publish: DateTime<Utc>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub status: Status,
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }

    /// Canonical path: `/blog/<year>/<month>/<day>/<slug>/` from the publish date.
    /// Renders empty when the slug cannot be reversed.
    pub fn absolute_url(&self) -> String {
        let (y, m, d) = (self.publish.year(), self.publish.month(), self.publish.day());
        reverse(POST_DETAIL, &[&y, &m, &d, &self.slug]).unwrap_or_else(|e| {
            warn!(target: "blogd::models", post = self.id, "no canonical url: {e}");
            String::new()
        })
    }

    pub fn to_document(&self) -> PostDocument {
        PostDocument {
            id: self.id,
            title: self.title.clone(),
            body: self.body.clone(),
            author: self.author.clone(),
            tags: self.tags.iter().map(|t| t.slug.clone()).collect(),
            publish: self.publish.timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub active: bool,
}

/// Lowercase ASCII slug: alphanumerics kept, runs of spaces, hyphens and
/// underscores collapsed to one `-`, everything else dropped.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }
    out
}
