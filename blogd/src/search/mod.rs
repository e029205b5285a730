use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use blog_api::response::SearchResponse;
use blog_query::ParsedQuery;

/// Cache key from a parsed query: lowercased terms in order, then filters.
pub fn normalize_key(pq: &ParsedQuery) -> String {
    let mut parts: Vec<String> = pq.terms.iter().map(|t| t.to_lowercase()).collect();
    if let Some(tag) = &pq.filters.tag {
        parts.push(format!("tag={}", tag.to_lowercase()));
    }
    if let Some(author) = &pq.filters.author {
        parts.push(format!("author={}", author.to_lowercase()));
    }
    parts.join("\u{1f}")
}

#[derive(Clone)]
struct CacheEntry {
    inserted: Instant,
    response: SearchResponse,
}

/// API responses keyed by [`normalize_key`], dropped after `ttl`.
pub struct HotQueryCache {
    ttl: Duration,
    map: Mutex<HashMap<String, CacheEntry>>,
}

impl HotQueryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<SearchResponse> {
        let mut m = self.map.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = m.get(key) {
            if entry.inserted.elapsed() <= self.ttl {
                return Some(entry.response.clone());
            }
        }
        m.remove(key);
        None
    }

    pub fn put(&self, key: String, response: SearchResponse) {
        let mut m = self.map.lock().unwrap_or_else(|e| e.into_inner());
        m.retain(|_, e| e.inserted.elapsed() <= self.ttl);
        m.insert(
            key,
            CacheEntry {
                inserted: Instant::now(),
                response,
            },
        );
    }

    /// Drop everything, e.g. after the catalog changed.
    pub fn clear(&self) {
        self.map.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
