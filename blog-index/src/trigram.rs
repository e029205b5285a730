use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{anyhow, Result};
use blog_query::trigram::{similarity_of_sets, trigrams, DEFAULT_THRESHOLD};
use blog_query::ParsedQuery;
use tracing::debug;

use crate::{matches_filters, PostDocument, SearchEngine, SearchHit};

#[derive(Debug, Clone)]
struct Entry {
    doc: PostDocument,
    title_trigrams: BTreeSet<String>,
}

enum Pending {
    Upsert(Entry),
    Remove,
}

/// In-memory engine ranking posts by trigram similarity of the title,
/// keeping only scores strictly above the threshold.
pub struct TrigramEngine {
    threshold: f32,
    pending: Mutex<BTreeMap<i64, Pending>>,
    committed: Mutex<BTreeMap<i64, Entry>>,
    visible: RwLock<Arc<Vec<Entry>>>,
}

impl Default for TrigramEngine {
    fn default() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }
}

impl TrigramEngine {
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            pending: Mutex::new(BTreeMap::new()),
            committed: Mutex::new(BTreeMap::new()),
            visible: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Number of documents visible to searches.
    pub fn num_docs(&self) -> usize {
        self.snapshot().map(|s| s.len()).unwrap_or(0)
    }

    fn snapshot(&self) -> Result<Arc<Vec<Entry>>> {
        let guard = self.visible.read().map_err(|_| anyhow!("trigram snapshot poisoned"))?;
        Ok(guard.clone())
    }
}

impl SearchEngine for TrigramEngine {
    fn engine_name(&self) -> &'static str {
        "trigram"
    }

    fn add(&self, doc: PostDocument) -> Result<()> {
        let entry = Entry {
            title_trigrams: trigrams(&doc.title),
            doc,
        };
        let mut pending = self.pending.lock().map_err(|_| anyhow!("pending lock poisoned"))?;
        pending.insert(entry.doc.id, Pending::Upsert(entry));
        Ok(())
    }

    fn remove(&self, post_id: i64) -> Result<()> {
        let mut pending = self.pending.lock().map_err(|_| anyhow!("pending lock poisoned"))?;
        pending.insert(post_id, Pending::Remove);
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let drained = {
            let mut pending = self.pending.lock().map_err(|_| anyhow!("pending lock poisoned"))?;
            std::mem::take(&mut *pending)
        };
        let mut committed = self.committed.lock().map_err(|_| anyhow!("committed lock poisoned"))?;
        for (id, op) in drained {
            match op {
                Pending::Upsert(entry) => {
                    committed.insert(id, entry);
                }
                Pending::Remove => {
                    committed.remove(&id);
                }
            }
        }
        debug!(target: "blog_index", docs = committed.len(), "trigram commit");
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        let entries: Vec<Entry> = {
            let committed = self.committed.lock().map_err(|_| anyhow!("committed lock poisoned"))?;
            committed.values().cloned().collect()
        };
        let mut visible = self.visible.write().map_err(|_| anyhow!("trigram snapshot poisoned"))?;
        *visible = Arc::new(entries);
        Ok(())
    }

    fn search(&self, query: &ParsedQuery, limit: usize) -> Result<Vec<SearchHit>> {
        let needle = trigrams(&query.text());
        if needle.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let snapshot = self.snapshot()?;
        let mut scored: Vec<(&Entry, f32)> = snapshot
            .iter()
            .filter(|e| matches_filters(&e.doc, query))
            .map(|e| (e, similarity_of_sets(&needle, &e.title_trigrams)))
            .filter(|(_, score)| *score > self.threshold)
            .collect();
        // ties: newest first, then id for a stable order
        scored.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.doc.publish.cmp(&a.doc.publish))
                .then(a.doc.id.cmp(&b.doc.id))
        });
        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(e, score)| SearchHit {
                post_id: e.doc.id,
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blog_query::parse_query;

    fn doc(id: i64, title: &str, tags: &[&str], publish: i64) -> PostDocument {
        PostDocument {
            id,
            title: title.into(),
            body: String::new(),
            author: "admin".into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            publish,
        }
    }

    fn engine_with(docs: Vec<PostDocument>) -> TrigramEngine {
        let engine = TrigramEngine::default();
        for d in docs {
            engine.add(d).unwrap();
        }
        engine.commit().unwrap();
        engine.refresh().unwrap();
        engine
    }

    #[test]
    fn writes_are_invisible_until_refresh() {
        let engine = TrigramEngine::default();
        engine.add(doc(1, "Rust", &[], 0)).unwrap();
        engine.commit().unwrap();
        assert_eq!(engine.num_docs(), 0);
        engine.refresh().unwrap();
        assert_eq!(engine.num_docs(), 1);
    }

    #[test]
    fn ranks_by_title_similarity_and_drops_weak_matches() {
        let engine = engine_with(vec![
            doc(1, "Learning Django", &[], 10),
            doc(2, "Django", &[], 20),
            doc(3, "Gardening tips", &[], 30),
        ]);
        let hits = engine.search(&parse_query("django"), usize::MAX).unwrap();
        let ids: Vec<i64> = hits.iter().map(|h| h.post_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(hits[0].score, 1.0);
        assert!(hits.iter().all(|h| h.score > DEFAULT_THRESHOLD));
    }

    #[test]
    fn equal_scores_prefer_newer_posts() {
        let engine = engine_with(vec![doc(1, "Notes", &[], 10), doc(2, "Notes", &[], 20)]);
        let hits = engine.search(&parse_query("notes"), 10).unwrap();
        assert_eq!(hits[0].post_id, 2);
        assert_eq!(hits[1].post_id, 1);
    }

    #[test]
    fn tag_filter_and_removal() {
        let engine = engine_with(vec![
            doc(1, "Rust web", &["web"], 10),
            doc(2, "Rust cli", &["cli"], 20),
        ]);
        let hits = engine.search(&parse_query("rust tag:web"), 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post_id, 1);

        engine.remove(1).unwrap();
        engine.commit().unwrap();
        engine.refresh().unwrap();
        assert!(engine.search(&parse_query("rust tag:web"), 10).unwrap().is_empty());
    }

    #[test]
    fn re_adding_replaces_document() {
        let engine = engine_with(vec![doc(1, "Old title", &[], 10)]);
        engine.add(doc(1, "Brand new", &[], 10)).unwrap();
        engine.commit().unwrap();
        engine.refresh().unwrap();
        assert_eq!(engine.num_docs(), 1);
        assert!(engine.search(&parse_query("old title"), 10).unwrap().is_empty());
        assert_eq!(engine.search(&parse_query("brand new"), 10).unwrap().len(), 1);
    }
}
