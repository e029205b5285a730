use std::path::PathBuf;
use std::time::Duration;

/// Server settings. Every field has a default; see [`SiteConfig::from_env`].
#[derive(Clone, Debug, PartialEq)]
pub struct SiteConfig {
    pub addr: String,
    pub static_dir: Option<PathBuf>,
    pub search_engine: String,
    pub index_dir: Option<PathBuf>,
    pub seed_file: Option<PathBuf>,
    /// Scheme and host used for absolute URLs in the sitemap.
    pub site_url: String,
    pub posts_per_page: usize,
    pub search_cache_ttl: Duration,
    pub comment_rate: usize,
    pub comment_window: Duration,
    pub latest_posts: usize,
    pub most_commented: usize,
    /// Relay for shared posts; without one messages only go to the log.
    pub smtp: Option<SmtpConfig>,
    pub mail_from: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

const DEFAULT_ADDR: &str = "127.0.0.1:8000";

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            static_dir: None,
            search_engine: "trigram".to_string(),
            index_dir: None,
            seed_file: None,
            site_url: format!("http://{DEFAULT_ADDR}"),
            posts_per_page: 3,
            search_cache_ttl: Duration::from_secs(20),
            comment_rate: 5,
            comment_window: Duration::from_secs(60),
            latest_posts: 3,
            most_commented: 5,
            smtp: None,
            mail_from: "webmaster@localhost".to_string(),
        }
    }
}

impl SiteConfig {
    /// - BLOG_ADDR (default 127.0.0.1:8000)
    /// - BLOG_STATIC_DIR (optional)
    /// - BLOG_SEARCH_ENGINE (`trigram` | `tantivy`, default trigram)
    /// - BLOG_INDEX_DIR (optional; on-disk tantivy index)
    /// - BLOG_SEED_FILE (optional; JSON posts when no database is configured)
    /// - BLOG_SITE_URL (default `http://` + BLOG_ADDR)
    /// - BLOG_POSTS_PER_PAGE (default 3)
    /// - BLOG_SEARCH_CACHE_SECS (default 20)
    /// - BLOG_COMMENT_RATE / BLOG_COMMENT_WINDOW_SECS (default 5 per 60s)
    /// - BLOG_SMTP_HOST (optional), BLOG_SMTP_PORT (default 25),
    ///   BLOG_SMTP_USER / BLOG_SMTP_PASSWORD (optional)
    /// - BLOG_MAIL_FROM (default webmaster@localhost)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let non_blank = |key: &str| {
            lookup(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        let usize_or = |key: &str, default: usize| {
            non_blank(key)
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .unwrap_or(default)
        };
        let secs_or = |key: &str, default: Duration| {
            non_blank(key)
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let addr = non_blank("BLOG_ADDR").unwrap_or(d.addr);
        let site_url = non_blank("BLOG_SITE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://{addr}"));
        let smtp = non_blank("BLOG_SMTP_HOST").map(|host| SmtpConfig {
            host,
            port: non_blank("BLOG_SMTP_PORT")
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(25),
            username: non_blank("BLOG_SMTP_USER"),
            password: lookup("BLOG_SMTP_PASSWORD").filter(|s| !s.is_empty()),
        });

        Self {
            static_dir: non_blank("BLOG_STATIC_DIR").map(PathBuf::from),
            search_engine: non_blank("BLOG_SEARCH_ENGINE")
                .map(|s| s.to_ascii_lowercase())
                .unwrap_or(d.search_engine),
            index_dir: non_blank("BLOG_INDEX_DIR").map(PathBuf::from),
            seed_file: non_blank("BLOG_SEED_FILE").map(PathBuf::from),
            posts_per_page: usize_or("BLOG_POSTS_PER_PAGE", d.posts_per_page),
            search_cache_ttl: secs_or("BLOG_SEARCH_CACHE_SECS", d.search_cache_ttl),
            comment_rate: usize_or("BLOG_COMMENT_RATE", d.comment_rate),
            comment_window: secs_or("BLOG_COMMENT_WINDOW_SECS", d.comment_window),
            latest_posts: d.latest_posts,
            most_commented: d.most_commented,
            smtp,
            mail_from: non_blank("BLOG_MAIL_FROM").unwrap_or(d.mail_from),
            addr,
            site_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> SiteConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SiteConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let c = from_pairs(&[]);
        assert_eq!(c, SiteConfig::default());
        assert_eq!(c.site_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn site_url_follows_addr_unless_set() {
        let c = from_pairs(&[("BLOG_ADDR", "0.0.0.0:9000")]);
        assert_eq!(c.site_url, "http://0.0.0.0:9000");
        let c = from_pairs(&[("BLOG_SITE_URL", "https://blog.example.com/")]);
        assert_eq!(c.site_url, "https://blog.example.com");
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let c = from_pairs(&[
            ("BLOG_POSTS_PER_PAGE", "0"),
            ("BLOG_SEARCH_CACHE_SECS", "soon"),
            ("BLOG_SEARCH_ENGINE", " Tantivy "),
            ("BLOG_STATIC_DIR", "  "),
        ]);
        assert_eq!(c.posts_per_page, 3);
        assert_eq!(c.search_cache_ttl, Duration::from_secs(20));
        assert_eq!(c.search_engine, "tantivy");
        assert_eq!(c.static_dir, None);
    }

    #[test]
    fn smtp_only_with_a_host() {
        assert_eq!(from_pairs(&[("BLOG_SMTP_PORT", "2525")]).smtp, None);
        let c = from_pairs(&[
            ("BLOG_SMTP_HOST", "mail.internal"),
            ("BLOG_SMTP_PORT", "nope"),
            ("BLOG_SMTP_USER", "blog"),
            ("BLOG_SMTP_PASSWORD", " s3cret "),
            ("BLOG_MAIL_FROM", "blog@example.com"),
        ]);
        assert_eq!(
            c.smtp,
            Some(SmtpConfig {
                host: "mail.internal".into(),
                port: 25,
                username: Some("blog".into()),
                password: Some(" s3cret ".into()),
            })
        );
        assert_eq!(c.mail_from, "blog@example.com");
    }
}
