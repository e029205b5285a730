//! Route table of the site and `reverse` for templates and views.

use blog_web::{NoReverseMatch, PatternError, UrlConf};
use once_cell::sync::Lazy;
use tracing::error;

pub const POST_LIST: &str = "blog:post_list";
pub const POST_LIST_BY_TAG: &str = "blog:post_list_by_tag";
pub const POST_DETAIL: &str = "blog:post_detail";
pub const POST_COMMENT: &str = "blog:post_comment";
pub const POST_SHARE: &str = "blog:post_share";
pub const POST_SEARCH: &str = "blog:post_search";
pub const SITEMAP: &str = "sitemap";
pub const API_SEARCH: &str = "api_search";
pub const HEALTH_READY: &str = "health_ready";
pub const STATIC: &str = "static";

pub fn build_urlconf() -> Result<UrlConf, PatternError> {
    let blog = UrlConf::new()
        .route("", "post_list")?
        .route("tag/<slug:tag_slug>/", "post_list_by_tag")?
        .route("<int:year>/<int:month>/<int:day>/<slug:post>/", "post_detail")?
        .route("<int:post_id>/share/", "post_share")?
        .route("<int:post_id>/comment/", "post_comment")?
        .route("search/", "post_search")?;
    UrlConf::new()
        .include("blog/", "blog", blog)?
        .route("sitemap.xml", SITEMAP)?
        .route("api/search", API_SEARCH)?
        .route("health/ready", HEALTH_READY)?
        .route("static/<path:path>", STATIC)
}

pub static URLCONF: Lazy<UrlConf> = Lazy::new(|| {
    build_urlconf().unwrap_or_else(|e| {
        error!(target: "blogd::urls", "invalid url pattern: {e}");
        UrlConf::new()
    })
});

pub fn reverse(name: &str, args: &[&dyn std::fmt::Display]) -> Result<String, NoReverseMatch> {
    URLCONF.reverse(name, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_build() {
        assert!(build_urlconf().is_ok());
    }

    #[test]
    fn every_named_route_reverses() {
        assert_eq!(reverse(POST_LIST, &[]).unwrap(), "/blog/");
        assert_eq!(reverse(POST_LIST_BY_TAG, &[&"rust"]).unwrap(), "/blog/tag/rust/");
        assert_eq!(
            reverse(POST_DETAIL, &[&2024, &3, &9, &"hello"]).unwrap(),
            "/blog/2024/3/9/hello/"
        );
        assert_eq!(reverse(POST_COMMENT, &[&7]).unwrap(), "/blog/7/comment/");
        assert_eq!(reverse(POST_SHARE, &[&7]).unwrap(), "/blog/7/share/");
        assert_eq!(reverse(POST_SEARCH, &[]).unwrap(), "/blog/search/");
        assert_eq!(reverse(SITEMAP, &[]).unwrap(), "/sitemap.xml");
        assert_eq!(reverse(API_SEARCH, &[]).unwrap(), "/api/search");
        assert_eq!(reverse(HEALTH_READY, &[]).unwrap(), "/health/ready");
        assert_eq!(reverse(STATIC, &[&"css/blog.css"]).unwrap(), "/static/css/blog.css");
    }
}
