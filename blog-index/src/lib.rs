use anyhow::{anyhow, Result};
use blog_query::ParsedQuery;

pub mod tantivy;
pub mod trigram;

/// Searchable projection of a published post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDocument {
    pub id: i64,
    pub title: String,
    pub body: String,
    pub author: String,
    pub tags: Vec<String>, // tag slugs
    pub publish: i64,      // unix seconds
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub post_id: i64,
    pub score: f32,
}

/// Pluggable post search engine.
/// Implementations are thread-safe; writes become visible to `search`
/// after `commit` followed by `refresh`.
pub trait SearchEngine: Send + Sync {
    fn engine_name(&self) -> &'static str;

    /// Add or replace the document with the same id.
    fn add(&self, doc: PostDocument) -> Result<()>;

    /// Remove a document by post id. Unknown ids are ignored.
    fn remove(&self, post_id: i64) -> Result<()>;

    /// Commit pending changes.
    fn commit(&self) -> Result<()>;

    /// Make committed changes visible to searchers.
    fn refresh(&self) -> Result<()>;

    /// Matching posts, best first, at most `limit` of them.
    fn search(&self, query: &ParsedQuery, limit: usize) -> Result<Vec<SearchHit>>;
}

pub const ENGINES: &[&str] = &["trigram", "tantivy"];

/// Select an engine implementation by name. Tantivy engines built here live in RAM;
/// use [`tantivy::TantivyEngine::open_or_create_in_dir`] for an on-disk index.
pub fn make_engine(name: &str) -> Result<Box<dyn SearchEngine>> {
    match name {
        "trigram" => Ok(Box::new(trigram::TrigramEngine::default())),
        "tantivy" => Ok(Box::new(tantivy::TantivyEngine::in_ram()?)),
        other => Err(anyhow!("unknown search engine: {other} (expected one of {ENGINES:?})")),
    }
}

/// Shared post-filter for `tag:` and `author:` constraints.
pub(crate) fn matches_filters(doc: &PostDocument, query: &ParsedQuery) -> bool {
    if let Some(tag) = &query.filters.tag {
        if !doc.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            return false;
        }
    }
    if let Some(author) = &query.filters.author {
        if doc.author.to_lowercase() != *author {
            return false;
        }
    }
    true
}
