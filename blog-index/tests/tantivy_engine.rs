use std::path::PathBuf;

use blog_index::tantivy::TantivyEngine;
use blog_index::{PostDocument, SearchEngine};
use blog_query::{parse_query, ParsedQuery, QueryFilters};

fn tempdir() -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("blog-index-{}-{}", std::process::id(), rand_suffix()));
    p
}

fn rand_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let ns = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{:x}", ns)
}

fn post(id: i64, title: &str, body: &str, tags: &[&str]) -> PostDocument {
    PostDocument {
        id,
        title: title.into(),
        body: body.into(),
        author: "Admin".into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        publish: 1_700_000_000 + id,
    }
}

#[test]
fn schema_contains_required_fields() {
    let (schema, fields) = TantivyEngine::build_schema();
    assert_eq!(schema.get_field_name(fields.id), "id");
    assert_eq!(schema.get_field_name(fields.title), "title");
    assert_eq!(schema.get_field_name(fields.body), "body");
    assert_eq!(schema.get_field_name(fields.author), "author");
    assert_eq!(schema.get_field_name(fields.tags), "tags");
    assert_eq!(schema.get_field_name(fields.publish), "publish");
}

#[test]
fn open_create_commit_refresh_updates_searcher_docs() {
    let dir = tempdir();
    let engine = TantivyEngine::open_or_create_in_dir(&dir).expect("open/create index");
    assert_eq!(engine.num_docs(), 0);
    engine.add(post(1, "Hello", "Hello world", &[])).expect("add doc");
    engine.commit().expect("commit");
    engine.refresh().expect("refresh");
    assert_eq!(engine.num_docs(), 1);
}

#[test]
fn stopwords_are_removed_in_query() {
    let engine = TantivyEngine::in_ram().expect("engine");
    engine.add(post(1, "The Rust Book", "The and of rust", &[])).unwrap();
    engine.commit().unwrap();
    engine.refresh().unwrap();

    let pq = ParsedQuery {
        terms: vec!["THE".into(), "and".into(), "RUST".into(), "of".into()],
        filters: QueryFilters::default(),
    };
    let hits = engine.search(&pq, 10).expect("search ok");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].post_id, 1);
}

#[test]
fn re_adding_a_post_replaces_it() {
    let engine = TantivyEngine::in_ram().expect("engine");
    engine.add(post(7, "Draft title", "first body", &[])).unwrap();
    engine.commit().unwrap();
    engine.add(post(7, "Final title", "second body", &[])).unwrap();
    engine.commit().unwrap();
    engine.refresh().unwrap();
    assert_eq!(engine.num_docs(), 1);
    assert!(engine.search(&parse_query("draft"), 10).unwrap().is_empty());
    assert_eq!(engine.search(&parse_query("final"), 10).unwrap().len(), 1);
}

#[test]
fn tag_filter_restricts_matches() {
    let engine = TantivyEngine::in_ram().expect("engine");
    engine.add(post(1, "Rust on the web", "axum", &["web"])).unwrap();
    engine.add(post(2, "Rust in the shell", "clap", &["cli"])).unwrap();
    engine.commit().unwrap();
    engine.refresh().unwrap();

    let all = engine.search(&parse_query("rust"), 10).unwrap();
    assert_eq!(all.len(), 2);
    let web = engine.search(&parse_query("rust tag:web"), 10).unwrap();
    assert_eq!(web.len(), 1);
    assert_eq!(web[0].post_id, 1);
}

#[test]
fn removed_posts_disappear_after_commit() {
    let engine = TantivyEngine::in_ram().expect("engine");
    engine.add(post(1, "Rust", "rust", &[])).unwrap();
    engine.commit().unwrap();
    engine.refresh().unwrap();
    engine.remove(1).unwrap();
    engine.commit().unwrap();
    engine.refresh().unwrap();
    assert!(engine.search(&parse_query("rust"), 10).unwrap().is_empty());
}
