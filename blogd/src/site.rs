//! Shared server state: catalog, search engine, caches and the optional
//! database handle.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use blog_db::Db;
use blog_index::SearchEngine;
use blog_query::{parse_query, ParsedQuery, QueryFilters};
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::catalog::Catalog;
use crate::config::SiteConfig;
use crate::forms::{NewComment, PostShare};
use crate::mail::{LogMailer, Mailer, OutgoingMail};
use crate::models::{Comment, Post};
use crate::search::HotQueryCache;
use crate::storage;
use crate::templates::tags::Sidebar;

/// Sliding-window limiter per client address.
pub struct IpRateLimiter {
    max: usize,
    window: Duration,
    map: Mutex<HashMap<IpAddr, VecDeque<Instant>>>,
}

impl IpRateLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut map = self.map.lock().unwrap_or_else(|e| e.into_inner());
        let q = map.entry(ip).or_default();
        while let Some(&t) = q.front() {
            if now.duration_since(t) > self.window {
                q.pop_front();
            } else {
                break;
            }
        }
        if q.len() < self.max {
            q.push_back(now);
            true
        } else {
            false
        }
    }
}

pub struct Site {
    config: SiteConfig,
    catalog: RwLock<Catalog>,
    engine: Box<dyn SearchEngine>,
    cache: HotQueryCache,
    comment_limiter: IpRateLimiter,
    mailer: Box<dyn Mailer>,
    db: Option<Arc<Db>>,
}

impl Site {
    /// Build the site and index every published post of `catalog`.
    pub fn new(
        config: SiteConfig,
        catalog: Catalog,
        engine: Box<dyn SearchEngine>,
        db: Option<Arc<Db>>,
    ) -> Result<Self> {
        let indexed = index_catalog(engine.as_ref(), &catalog)?;
        info!(
            target: "blogd::site",
            engine = engine.engine_name(),
            posts = indexed,
            "search index ready"
        );
        Ok(Self {
            cache: HotQueryCache::new(config.search_cache_ttl),
            comment_limiter: IpRateLimiter::new(config.comment_rate, config.comment_window),
            config,
            catalog: RwLock::new(catalog),
            engine,
            mailer: Box::new(LogMailer),
            db,
        })
    }

    /// Replace the default log-only mailer.
    pub fn with_mailer(mut self, mailer: Box<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn catalog(&self) -> RwLockReadGuard<'_, Catalog> {
        self.catalog.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn engine(&self) -> &dyn SearchEngine {
        self.engine.as_ref()
    }

    pub fn cache(&self) -> &HotQueryCache {
        &self.cache
    }

    pub fn sidebar(&self) -> Sidebar {
        Sidebar::from_catalog(&self.catalog(), self.config.latest_posts, self.config.most_commented)
    }

    /// Published posts matching `query`, best first, with their scores.
    /// `tag:` and `author:` tokens narrow the results instead of being scored.
    pub fn search(&self, query: &str) -> Result<Vec<(Post, f32)>> {
        self.run_search(query, &parse_query(query))
    }

    /// Like [`Site::search`] but the whole text is scored against titles,
    /// colons included.
    pub fn search_titles(&self, query: &str) -> Result<Vec<(Post, f32)>> {
        let pq = ParsedQuery {
            terms: vec![query.to_string()],
            filters: QueryFilters::default(),
        };
        self.run_search(query, &pq)
    }

    fn run_search(&self, query: &str, pq: &ParsedQuery) -> Result<Vec<(Post, f32)>> {
        let hits = self
            .engine
            .search(pq, usize::MAX)
            .with_context(|| format!("search failed for {query:?}"))?;
        let catalog = self.catalog();
        let ids: Vec<i64> = hits.iter().map(|h| h.post_id).collect();
        let scores: HashMap<i64, f32> = hits.iter().map(|h| (h.post_id, h.score)).collect();
        let out: Vec<(Post, f32)> = catalog
            .published_in_order(&ids)
            .into_iter()
            .map(|p| (p.clone(), scores.get(&p.id).copied().unwrap_or_default()))
            .collect();
        debug!(target: "blogd::search", query, hits = out.len(), "search");
        Ok(out)
    }

    pub fn allow_comment(&self, ip: Option<IpAddr>) -> bool {
        ip.map(|ip| self.comment_limiter.allow(ip)).unwrap_or(true)
    }

    /// Record a comment on a published post. It is visible immediately; when a
    /// database is configured it is also written there in the background.
    pub fn add_comment(&self, post_id: i64, new: &NewComment) -> Option<Comment> {
        let comment = {
            let mut catalog = self.catalog.write().unwrap_or_else(|e| e.into_inner());
            catalog.published_by_id(post_id)?;
            catalog.add_comment(post_id, &new.name, &new.email, &new.body, Utc::now())
        };
        info!(target: "blogd::site", post = post_id, comment = comment.id, "comment added");
        if let Some(db) = &self.db {
            persist_comment(db.clone(), comment.clone());
        }
        Some(comment)
    }

    /// Mail a recommendation of `post` to `share.to`.
    pub fn share_post(&self, post: &Post, share: &PostShare) -> Result<()> {
        let base = Url::parse(&self.config.site_url)
            .with_context(|| format!("invalid site url {:?}", self.config.site_url))?;
        let post_url = base
            .join(&post.absolute_url())
            .with_context(|| format!("joining url of post {}", post.id))?;
        let mail = OutgoingMail {
            to: share.to.clone(),
            subject: format!("{} ({}) recommends you read {}", share.name, share.email, post.title),
            body: format!(
                "Read {} at {}\n\n{}'s comments: {}",
                post.title, post_url, share.name, share.comments
            ),
        };
        self.mailer.send(mail)?;
        info!(target: "blogd::site", post = post.id, mailer = self.mailer.name(), "post shared");
        Ok(())
    }
}

fn persist_comment(db: Arc<Db>, comment: Comment) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        warn!(target: "blogd::storage", "no runtime; comment {} not persisted", comment.id);
        return;
    };
    handle.spawn(async move {
        let result = match db.get_pool().await {
            Ok(pool) => storage::insert_comment(pool, &comment).await,
            Err(e) => Err(e.into()),
        };
        match result {
            Ok(id) => debug!(target: "blogd::storage", id, "comment persisted"),
            Err(e) => warn!(target: "blogd::storage", post = comment.post_id, "comment insert failed: {e:#}"),
        }
    });
}

/// Add every published post to `engine`, then commit and refresh.
pub fn index_catalog(engine: &dyn SearchEngine, catalog: &Catalog) -> Result<usize> {
    let published = catalog.published();
    for post in &published {
        engine
            .add(post.to_document())
            .with_context(|| format!("indexing post {}", post.id))?;
    }
    engine.commit().context("search index commit")?;
    engine.refresh().context("search index refresh")?;
    Ok(published.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn limiter_blocks_after_max_in_window() {
        let limiter = IpRateLimiter::new(2, Duration::from_secs(60));
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiter.allow(ip));
        assert!(limiter.allow(ip));
        assert!(!limiter.allow(ip));
        assert!(limiter.allow(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))));
    }
}
