use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub use sqlx::PgPool;

mod config;

pub use config::DbConfig;

pub mod tables {
    pub const POSTS: &str = "blog_post";
    pub const TAGS: &str = "blog_tag";
    pub const POST_TAGS: &str = "blog_post_tags";
    pub const COMMENTS: &str = "blog_comment";
}

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

const MAX_BACKOFF_MS: u64 = 30_000;

pub struct Db {
    cfg: DbConfig,
    pool: OnceCell<PgPool>,
    migrated: OnceCell<()>,
}

impl Db {
    pub fn new(cfg: DbConfig) -> Self {
        Self {
            cfg,
            pool: OnceCell::new(),
            migrated: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &DbConfig {
        &self.cfg
    }

    /// - Eager mode: connect with retries and return error if unavailable.
    /// - Lazy mode: attempt connect with retries; if it fails, log a warning and continue.
    pub async fn init(&self) -> Result<(), DbInitError> {
        match self.try_connect_with_retry().await {
            Ok(pool) => {
                let _ = self.pool.set(pool);
                if self.cfg.migrate_on_start {
                    if let Some(pool) = self.pool.get() {
                        self.ensure_migrated(pool).await?;
                    }
                }
                Ok(())
            }
            Err(e) if self.cfg.eager_init => Err(e),
            Err(e) => {
                warn!(target: "blog_db", "database not available at startup (lazy): {e}");
                Ok(())
            }
        }
    }

    /// Get a connection pool, initializing it with retries on first use.
    /// If migrations are enabled, they run after the first successful connect.
    pub async fn get_pool(&self) -> Result<&PgPool, DbInitError> {
        let pool = self
            .pool
            .get_or_try_init(|| async { self.try_connect_with_retry().await })
            .await?;
        if self.cfg.migrate_on_start {
            self.ensure_migrated(pool).await?;
        }
        Ok(pool)
    }

    /// A quick status probe with a short timeout.
    pub async fn health_check(&self) -> HealthStatus {
        if self.cfg.database_url.is_none() {
            return HealthStatus::NoUrl;
        }
        let Some(pool) = self.pool.get() else {
            return HealthStatus::NotInitialized;
        };

        match tokio::time::timeout(Duration::from_secs(1), sqlx::query("SELECT 1").execute(pool))
            .await
        {
            Ok(Ok(_)) => HealthStatus::Ok,
            Ok(Err(e)) => HealthStatus::Error(e.to_string()),
            Err(_) => HealthStatus::Error("health check timed out".to_string()),
        }
    }

    fn build_pool_options(&self) -> PgPoolOptions {
        let mut opts = PgPoolOptions::new()
            .min_connections(self.cfg.min_connections)
            .max_connections(self.cfg.max_connections)
            .acquire_timeout(Duration::from_secs(self.cfg.acquire_timeout_secs));

        if let Some(secs) = self.cfg.idle_timeout_secs {
            opts = opts.idle_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.cfg.max_lifetime_secs {
            opts = opts.max_lifetime(Duration::from_secs(secs));
        }
        opts
    }

    async fn try_connect_with_retry(&self) -> Result<PgPool, DbInitError> {
        let url = self
            .cfg
            .database_url
            .as_deref()
            .ok_or(DbInitError::MissingUrl)?;

        let max = self.cfg.retry_max_attempts.max(1);
        let connect_timeout_secs = self.cfg.connect_timeout_secs;

        let mut last_err: Option<String> = None;
        for attempt in 1..=max {
            let connect_future = self.build_pool_options().connect(url);
            let result = if connect_timeout_secs > 0 {
                match tokio::time::timeout(Duration::from_secs(connect_timeout_secs), connect_future)
                    .await
                {
                    Ok(inner) => inner.map_err(|e| e.to_string()),
                    Err(_) => Err(format!(
                        "connect attempt timed out after {connect_timeout_secs}s"
                    )),
                }
            } else {
                connect_future.await.map_err(|e| e.to_string())
            };

            match result {
                Ok(pool) => {
                    debug!(target: "blog_db", attempt, "connected to database");
                    return Ok(pool);
                }
                Err(msg) => {
                    if attempt < max {
                        let delay = compute_backoff_ms(self.cfg.retry_base_backoff_ms, attempt);
                        warn!(
                            target: "blog_db",
                            "db connect attempt {attempt}/{max} failed: {msg} ; retrying in {delay} ms"
                        );
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                    last_err = Some(msg);
                }
            }
        }

        Err(DbInitError::Connect {
            attempts: max,
            last_error: last_err.unwrap_or_else(|| "unknown error".to_string()),
        })
    }

    async fn ensure_migrated(&self, pool: &PgPool) -> Result<(), DbInitError> {
        self.migrated
            .get_or_try_init(|| async {
                info!(target: "blog_db", "running database migrations");
                MIGRATOR
                    .run(pool)
                    .await
                    .map_err(|e| DbInitError::Migrate(e.to_string()))
            })
            .await
            .map(|_| ())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DbInitError {
    #[error("DATABASE_URL is not set")]
    MissingUrl,

    #[error("failed to connect after {attempts} attempt(s): {last_error}")]
    Connect { attempts: u32, last_error: String },

    #[error("migrations failed: {0}")]
    Migrate(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    NoUrl,
    NotInitialized,
    Ok,
    Error(String),
}

/// Exponential backoff capped at 30s, plus up to `base_ms / 2` of jitter.
fn compute_backoff_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    let capped = base_ms.saturating_mul(factor).min(MAX_BACKOFF_MS);
    let jitter = fastrand::u64(0..(base_ms / 2 + 1));
    capped.saturating_add(jitter)
}
