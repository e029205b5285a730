//! In-memory posts, tags and comments read by the views.
//!
//! Only published posts are ever returned; drafts stay in the catalog so a
//! later status change can be re-indexed without reloading.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};

use crate::models::{Comment, Post, Tag};

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Catalog {
    pub fn new(posts: Vec<Post>, comments: Vec<Comment>) -> Self {
        let mut catalog = Self { posts, comments };
        catalog.sort();
        catalog
    }

    fn sort(&mut self) {
        self.posts
            .sort_by(|a, b| b.publish.cmp(&a.publish).then(b.id.cmp(&a.id)));
        self.comments
            .sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
    }

    pub fn all_posts(&self) -> &[Post] {
        &self.posts
    }

    /// Published posts, newest first.
    pub fn published(&self) -> Vec<&Post> {
        self.posts.iter().filter(|p| p.is_published()).collect()
    }

    pub fn published_with_tag(&self, tag_slug: &str) -> Vec<&Post> {
        self.posts
            .iter()
            .filter(|p| p.is_published() && p.tags.iter().any(|t| t.slug == tag_slug))
            .collect()
    }

    /// Any tag with this slug, attached to any post.
    pub fn tag(&self, slug: &str) -> Option<&Tag> {
        self.posts
            .iter()
            .flat_map(|p| p.tags.iter())
            .find(|t| t.slug == slug)
    }

    pub fn published_by_id(&self, id: i64) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == id && p.is_published())
    }

    pub fn published_by_date_slug(&self, year: i64, month: i64, day: i64, slug: &str) -> Option<&Post> {
        self.posts.iter().find(|p| {
            p.is_published()
                && p.slug == slug
                && i64::from(p.publish.year()) == year
                && i64::from(p.publish.month()) == month
                && i64::from(p.publish.day()) == day
        })
    }

    /// Posts in the order of `ids`, skipping drafts and unknown ids.
    pub fn published_in_order(&self, ids: &[i64]) -> Vec<&Post> {
        let by_id: HashMap<i64, &Post> = self
            .posts
            .iter()
            .filter(|p| p.is_published())
            .map(|p| (p.id, p))
            .collect();
        ids.iter().filter_map(|id| by_id.get(id).copied()).collect()
    }

    pub fn active_comments(&self, post_id: i64) -> Vec<&Comment> {
        self.comments
            .iter()
            .filter(|c| c.post_id == post_id && c.active)
            .collect()
    }

    /// All comments of a post, active or not.
    pub fn comment_count(&self, post_id: i64) -> usize {
        self.comments.iter().filter(|c| c.post_id == post_id).count()
    }

    /// Published posts sharing at least one tag with `post`, most shared tags
    /// first, then newest.
    pub fn similar_posts(&self, post: &Post, limit: usize) -> Vec<&Post> {
        let mut scored: Vec<(usize, &Post)> = self
            .posts
            .iter()
            .filter(|p| p.is_published() && p.id != post.id)
            .filter_map(|p| {
                let shared = p
                    .tags
                    .iter()
                    .filter(|t| post.tags.iter().any(|own| own.slug == t.slug))
                    .count();
                (shared > 0).then_some((shared, p))
            })
            .collect();
        scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then(b.publish.cmp(&a.publish)));
        scored.into_iter().take(limit).map(|(_, p)| p).collect()
    }

    pub fn latest(&self, count: usize) -> Vec<&Post> {
        self.published().into_iter().take(count).collect()
    }

    pub fn total_published(&self) -> usize {
        self.posts.iter().filter(|p| p.is_published()).count()
    }

    pub fn most_commented(&self, count: usize) -> Vec<(&Post, usize)> {
        let mut counted: Vec<(&Post, usize)> = self
            .published()
            .into_iter()
            .map(|p| (p, self.comment_count(p.id)))
            .collect();
        // published() is already newest first and sort_by is stable
        counted.sort_by(|(_, a), (_, b)| b.cmp(a));
        counted.truncate(count);
        counted
    }

    pub fn add_comment(
        &mut self,
        post_id: i64,
        name: &str,
        email: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Comment {
        let id = self.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let comment = Comment {
            id,
            post_id,
            name: name.to_string(),
            email: email.to_string(),
            body: body.to_string(),
            created: now,
            updated: now,
            active: true,
        };
        self.comments.push(comment.clone());
        comment
    }
}
