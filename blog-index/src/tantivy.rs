use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use blog_query::ParsedQuery;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, SchemaBuilder, TextFieldIndexing, TextOptions, FAST,
    INDEXED, STORED, STRING,
};
use tantivy::{Document as _, Index, IndexReader, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info};

use crate::{PostDocument, SearchEngine, SearchHit};

const WRITER_HEAP_BYTES: usize = 50_000_000;
const TITLE_BOOST: f32 = 2.0;

/// Field handles for fast access at query time.
#[derive(Debug, Clone)]
pub struct TantivyFields {
    pub id: Field,
    pub title: Field,
    pub body: Field,
    pub author: Field,
    pub tags: Field,
    pub publish: Field,
}

/// BM25 engine over post title and body.
pub struct TantivyEngine {
    pub schema: Schema,
    pub fields: TantivyFields,
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
}

impl TantivyEngine {
    /// Schema: id, title, body, author, tags, publish.
    pub fn build_schema() -> (Schema, TantivyFields) {
        // positions+freqs on text fields for BM25
        let text_indexing = TextFieldIndexing::default()
            .set_index_option(IndexRecordOption::WithFreqsAndPositions)
            .set_tokenizer("en_stops");
        let text_with_positions = TextOptions::default()
            .set_indexing_options(text_indexing)
            .set_stored();

        let mut sb = SchemaBuilder::default();
        let id = sb.add_i64_field("id", INDEXED | FAST | STORED);
        let title = sb.add_text_field("title", text_with_positions.clone());
        let body = sb.add_text_field("body", text_with_positions);
        let author = sb.add_text_field("author", STRING | STORED);
        let tags = sb.add_text_field("tags", STRING | STORED);
        let publish = sb.add_i64_field("publish", INDEXED | FAST | STORED);
        let schema = sb.build();
        let fields = TantivyFields {
            id,
            title,
            body,
            author,
            tags,
            publish,
        };
        (schema, fields)
    }

    pub fn in_ram() -> Result<Self> {
        let (schema, fields) = Self::build_schema();
        let index = Index::create_in_ram(schema.clone());
        Self::from_index(index, schema, fields)
    }

    /// Open an existing index at `dir`, or create one if missing.
    pub fn open_or_create_in_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let (schema, fields) = Self::build_schema();
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating index dir {}", dir.display()))?;
        }
        let index = if dir.join("meta.json").exists() {
            Index::open_in_dir(dir).context("open tantivy index")?
        } else {
            Index::create_in_dir(dir, schema.clone()).context("create tantivy index")?
        };
        info!(target: "blog_index", dir = %dir.display(), "tantivy index ready");
        Self::from_index(index, schema, fields)
    }

    fn from_index(index: Index, schema: Schema, fields: TantivyFields) -> Result<Self> {
        register_tokenizer_en(&index);
        let reader = index.reader().context("build index reader")?;
        let writer = index
            .writer(WRITER_HEAP_BYTES)
            .context("create index writer")?;
        Ok(Self {
            schema,
            fields,
            index,
            reader,
            writer: Mutex::new(writer),
        })
    }

    /// Number of documents visible to the current searcher.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    fn text_query(&self, tokens: &[String]) -> Box<dyn Query> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for t in tokens {
            let term_title = Term::from_field_text(self.fields.title, t);
            let term_body = Term::from_field_text(self.fields.body, t);
            clauses.push((
                Occur::Should,
                Box::new(BoostQuery::new(
                    Box::new(TermQuery::new(
                        term_title,
                        IndexRecordOption::WithFreqsAndPositions,
                    )),
                    TITLE_BOOST,
                )),
            ));
            clauses.push((
                Occur::Should,
                Box::new(TermQuery::new(
                    term_body,
                    IndexRecordOption::WithFreqsAndPositions,
                )),
            ));
        }
        Box::new(BooleanQuery::new(clauses))
    }
}

impl SearchEngine for TantivyEngine {
    fn engine_name(&self) -> &'static str {
        "tantivy"
    }

    fn add(&self, doc: PostDocument) -> Result<()> {
        let mut tdoc = TantivyDocument::default();
        tdoc.add_i64(self.fields.id, doc.id);
        tdoc.add_text(self.fields.title, &doc.title);
        tdoc.add_text(self.fields.body, &doc.body);
        tdoc.add_text(self.fields.author, doc.author.to_lowercase());
        for tag in &doc.tags {
            tdoc.add_text(self.fields.tags, tag.to_lowercase());
        }
        tdoc.add_i64(self.fields.publish, doc.publish);

        let writer = self.writer.lock().map_err(|_| anyhow!("writer lock poisoned"))?;
        writer.delete_term(Term::from_field_i64(self.fields.id, doc.id));
        writer.add_document(tdoc).context("add document")?;
        Ok(())
    }

    fn remove(&self, post_id: i64) -> Result<()> {
        let writer = self.writer.lock().map_err(|_| anyhow!("writer lock poisoned"))?;
        writer.delete_term(Term::from_field_i64(self.fields.id, post_id));
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| anyhow!("writer lock poisoned"))?;
        let opstamp = writer.commit().context("writer commit")?;
        debug!(target: "blog_index", opstamp, "tantivy commit");
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        self.reader.reload().context("reader reload")?;
        Ok(())
    }

    fn search(&self, query: &ParsedQuery, limit: usize) -> Result<Vec<SearchHit>> {
        let tokens = analyze_terms(&query.terms);
        if tokens.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();
        // TopDocs preallocates `limit` slots
        let limit = limit.min(searcher.num_docs().max(1) as usize);

        let mut must: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Must, self.text_query(&tokens))];
        if let Some(tag) = &query.filters.tag {
            must.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.fields.tags, tag),
                    IndexRecordOption::Basic,
                )),
            ));
        }
        if let Some(author) = &query.filters.author {
            must.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.fields.author, author),
                    IndexRecordOption::Basic,
                )),
            ));
        }
        let bool_query = BooleanQuery::new(must);
        let top_docs = searcher.search(&bool_query, &TopDocs::with_limit(limit))?;

        let mut out = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            let doc = searcher.doc::<TantivyDocument>(addr)?;
            let json = doc.to_json(&self.schema);
            let v: serde_json::Value =
                serde_json::from_str(&json).unwrap_or(serde_json::json!({}));
            let Some(post_id) = v.get("id").and_then(first_i64) else {
                continue;
            };
            out.push(SearchHit { post_id, score });
        }
        Ok(out)
    }
}

fn first_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::Array(arr) => arr.iter().find_map(|x| x.as_i64()),
        serde_json::Value::Object(map) => map.get("value").and_then(|x| x.as_i64()),
        _ => None,
    }
}

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "in", "to", "for", "on", "with", "is", "it", "this",
    "that", "by", "be", "as", "at", "from",
];

fn analyze_terms(raw_terms: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for term in raw_terms {
        for tok in term.split(|c: char| !c.is_alphanumeric()) {
            let t = tok.to_lowercase();
            if t.is_empty() || STOPWORDS.contains(&t.as_str()) {
                continue;
            }
            out.push(t);
        }
    }
    out
}

fn register_tokenizer_en(index: &Index) {
    use tantivy::tokenizer::{LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
    // lowercase + stopword removal
    let stopwords: Vec<String> = STOPWORDS.iter().map(|s| s.to_string()).collect();
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(StopWordFilter::remove(stopwords))
        .build();
    index.tokenizers().register("en_stops", analyzer);
}
