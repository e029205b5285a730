//! Index and query a synthetic blog with one engine and print timings.
//!
//! BENCH_ENGINE (trigram | tantivy), BENCH_DOCS, BENCH_QUERIES,
//! BENCH_OUTPUT (json | text), BENCH_DIR (on-disk tantivy index).

use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;

use blogd::index::tantivy::TantivyEngine;
use blogd::index::{make_engine, PostDocument, SearchEngine};
use blogd::query::parse_query;

const TITLES: [&str; 4] = [
    "Getting started with Rust",
    "Django search with trigrams",
    "Notes on PostgreSQL indexes",
    "Weekend gardening log",
];

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn main() -> Result<()> {
    let engine_name = env::var("BENCH_ENGINE").unwrap_or_else(|_| "trigram".to_string());
    let docs = env_usize("BENCH_DOCS", 2_000);
    let queries = env_usize("BENCH_QUERIES", 1_000);
    let output = env::var("BENCH_OUTPUT").unwrap_or_else(|_| "json".to_string());

    let engine: Box<dyn SearchEngine> = match (engine_name.as_str(), env::var("BENCH_DIR")) {
        ("tantivy", Ok(dir)) => Box::new(
            TantivyEngine::open_or_create_in_dir(&dir)
                .with_context(|| format!("opening index at {dir}"))?,
        ),
        (name, _) => make_engine(name)?,
    };

    let t0 = Instant::now();
    for i in 0..docs {
        engine.add(PostDocument {
            id: i as i64 + 1,
            title: format!("{} #{i}", TITLES[i % TITLES.len()]),
            body: "Lorem ipsum dolor sit amet, consectetur adipiscing elit.".into(),
            author: if i % 2 == 0 { "admin" } else { "guest" }.into(),
            tags: vec![["rust", "django", "postgres", "garden"][i % 4].into()],
            publish: 1_700_000_000 + i as i64,
        })?;
    }
    engine.commit()?;
    engine.refresh()?;
    let index_elapsed = t0.elapsed();

    let samples = [parse_query("rust"), parse_query("trigram search"), parse_query("indexes tag:postgres")];
    let mut latencies: Vec<u128> = Vec::with_capacity(queries);
    let mut total_hits = 0usize;
    let t1 = Instant::now();
    for i in 0..queries {
        let start = Instant::now();
        total_hits += engine.search(&samples[i % samples.len()], 10)?.len();
        latencies.push(start.elapsed().as_micros());
    }
    let search_elapsed = t1.elapsed();

    latencies.sort_unstable();
    let p = |q: f64| -> u128 {
        if latencies.is_empty() {
            return 0;
        }
        latencies[((latencies.len() as f64 - 1.0) * q).round() as usize]
    };
    let qps = queries as f64 / search_elapsed.as_secs_f64().max(f64::EPSILON);

    if output == "json" {
        println!(
            "{}",
            json!({
                "engine": engine.engine_name(),
                "docs_indexed": docs,
                "index_time_ms": index_elapsed.as_millis(),
                "queries": queries,
                "hits": total_hits,
                "qps": qps,
                "latency_us": { "p50": p(0.50), "p95": p(0.95), "p99": p(0.99) },
            })
        );
    } else {
        println!(
            "engine={} docs={docs} index_time_ms={} qps={qps:.1} p50_us={} p95_us={} p99_us={}",
            engine.engine_name(),
            index_elapsed.as_millis(),
            p(0.50),
            p(0.95),
            p(0.99)
        );
    }
    Ok(())
}
