use anyhow::{Context, Result};
use url::Url;

use crate::catalog::Catalog;
use crate::templates::filters::escape;

pub const CHANGEFREQ: &str = "weekly";
pub const PRIORITY: &str = "0.9";

/// `urlset` document listing every published post under `site_url`.
pub fn render(catalog: &Catalog, site_url: &str) -> Result<String> {
    let base = Url::parse(site_url).with_context(|| format!("invalid site url {site_url:?}"))?;
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\" xmlns:xhtml=\"http://www.w3.org/1999/xhtml\">\n",
    );
    for post in catalog.published() {
        let path = post.absolute_url();
        if path.is_empty() {
            continue;
        }
        let loc = base.join(&path).with_context(|| format!("joining {path:?}"))?;
        out.push_str(&format!(
            "<url><loc>{}</loc><lastmod>{}</lastmod><changefreq>{CHANGEFREQ}</changefreq><priority>{PRIORITY}</priority></url>\n",
            escape(loc.as_str()),
            post.updated.format("%Y-%m-%d"),
        ));
    }
    out.push_str("</urlset>\n");
    Ok(out)
}
