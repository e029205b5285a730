//! PostgreSQL reads for startup hydration and the comment insert.

use std::collections::HashMap;

use anyhow::Result;
use blog_db::{tables, PgPool};
use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::warn;

use crate::models::{Comment, Post, Status, Tag};

/// Every post with its tags, drafts included.
pub async fn load_posts(pool: &PgPool) -> Result<Vec<Post>> {
    let tag_rows = sqlx::query(&format!(
        "SELECT pt.post_id, t.name, t.slug
           FROM {} pt
           JOIN {} t ON t.id = pt.tag_id
          ORDER BY t.name",
        tables::POST_TAGS,
        tables::TAGS
    ))
    .fetch_all(pool)
    .await?;
    let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
    for r in tag_rows {
        let post_id: i64 = r.try_get("post_id")?;
        tags.entry(post_id).or_default().push(Tag {
            name: r.try_get("name")?,
            slug: r.try_get("slug")?,
        });
    }

    let rows = sqlx::query(&format!(
        "SELECT id, title, slug, author, body, publish, created, updated, status
           FROM {}
          ORDER BY publish DESC",
        tables::POSTS
    ))
    .fetch_all(pool)
    .await?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        let id: i64 = r.try_get("id")?;
        let code: String = r.try_get("status")?;
        let Some(status) = Status::from_code(&code) else {
            warn!(target: "blogd::storage", post = id, status = %code, "skipping post with unknown status");
            continue;
        };
        out.push(Post {
            id,
            title: r.try_get("title")?,
            slug: r.try_get("slug")?,
            author: r.try_get("author")?,
            body: r.try_get("body")?,
            publish: r.try_get::<DateTime<Utc>, _>("publish")?,
            created: r.try_get::<DateTime<Utc>, _>("created")?,
            updated: r.try_get::<DateTime<Utc>, _>("updated")?,
            status,
            tags: tags.remove(&id).unwrap_or_default(),
        });
    }
    Ok(out)
}

pub async fn load_comments(pool: &PgPool) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&format!(
        "SELECT id, post_id, name, email, body, created, updated, active
           FROM {}
          ORDER BY created ASC",
        tables::COMMENTS
    ))
    .fetch_all(pool)
    .await?;
    let mut out = Vec::with_capacity(rows.len());
    for r in rows {
        out.push(Comment {
            id: r.try_get("id")?,
            post_id: r.try_get("post_id")?,
            name: r.try_get("name")?,
            email: r.try_get("email")?,
            body: r.try_get("body")?,
            created: r.try_get("created")?,
            updated: r.try_get("updated")?,
            active: r.try_get("active")?,
        });
    }
    Ok(out)
}

/// Insert a comment and return the id the database assigned.
pub async fn insert_comment(pool: &PgPool, comment: &Comment) -> Result<i64> {
    let row = sqlx::query(&format!(
        "INSERT INTO {} (post_id, name, email, body, created, updated, active)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING id",
        tables::COMMENTS
    ))
    .bind(comment.post_id)
    .bind(&comment.name)
    .bind(&comment.email)
    .bind(&comment.body)
    .bind(comment.created)
    .bind(comment.updated)
    .bind(comment.active)
    .fetch_one(pool)
    .await?;
    Ok(row.try_get("id")?)
}
