use std::sync::Arc;

use anyhow::{Context, Result};
use blog_db::{Db, DbConfig};
use blog_index::{make_engine, tantivy::TantivyEngine, SearchEngine};
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::SiteConfig;
use crate::mail::make_mailer;
use crate::site::Site;
use crate::{seed, storage};

/// Database first, then the seed file, else an empty blog.
pub async fn load_catalog(cfg: &SiteConfig, db: Option<&Db>) -> Result<Catalog> {
    if let Some(db) = db {
        let pool = db.get_pool().await.context("database pool acquisition failed")?;
        let posts = storage::load_posts(pool).await.context("loading posts")?;
        let comments = storage::load_comments(pool).await.context("loading comments")?;
        info!(target: "blogd::startup", posts = posts.len(), comments = comments.len(), "catalog loaded from database");
        return Ok(Catalog::new(posts, comments));
    }
    if let Some(path) = &cfg.seed_file {
        let catalog = seed::load(path)?;
        info!(
            target: "blogd::startup",
            path = %path.display(),
            posts = catalog.all_posts().len(),
            "catalog loaded from seed file"
        );
        return Ok(catalog);
    }
    warn!(target: "blogd::startup", "no DATABASE_URL or BLOG_SEED_FILE; starting with an empty blog");
    Ok(Catalog::default())
}

/// Engine named by the config; tantivy goes on disk when an index dir is set.
pub fn build_engine(cfg: &SiteConfig) -> Result<Box<dyn SearchEngine>> {
    if cfg.search_engine == "tantivy" {
        if let Some(dir) = &cfg.index_dir {
            match TantivyEngine::open_or_create_in_dir(dir) {
                Ok(engine) => {
                    info!(target: "blogd::startup", dir = %dir.display(), "using on-disk tantivy index");
                    return Ok(Box::new(engine));
                }
                Err(e) => warn!(
                    target: "blogd::startup",
                    dir = %dir.display(),
                    "failed to open tantivy index: {e:#}; falling back to RAM"
                ),
            }
        }
    }
    make_engine(&cfg.search_engine)
}

pub async fn build_site(cfg: SiteConfig, db_cfg: DbConfig) -> Result<Site> {
    let db = if db_cfg.is_configured() {
        let db = Db::new(db_cfg);
        db.init().await.context("database init failed")?;
        Some(Arc::new(db))
    } else {
        None
    };
    let catalog = load_catalog(&cfg, db.as_deref()).await?;
    let engine = build_engine(&cfg)?;
    let mailer = make_mailer(&cfg)?;
    Ok(Site::new(cfg, catalog, engine, db)?.with_mailer(mailer))
}
