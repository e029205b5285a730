use crate::catalog::Catalog;
use crate::models::Post;

use super::filters::escape;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostLink {
    pub title: String,
    pub url: String,
}

impl From<&Post> for PostLink {
    fn from(p: &Post) -> Self {
        Self {
            title: p.title.clone(),
            url: p.absolute_url(),
        }
    }
}

pub fn total_posts(catalog: &Catalog) -> usize {
    catalog.total_published()
}

/// Newest published posts as a link list.
pub fn show_latest_posts(catalog: &Catalog, count: usize) -> String {
    let links: Vec<PostLink> = catalog
        .latest(count)
        .into_iter()
        .map(PostLink::from)
        .collect();
    link_list(&links)
}

pub fn get_most_commented_posts(catalog: &Catalog, count: usize) -> Vec<PostLink> {
    catalog
        .most_commented(count)
        .into_iter()
        .map(|(p, _)| PostLink::from(p))
        .collect()
}

fn link_list(links: &[PostLink]) -> String {
    let mut out = String::from("<ul>\n");
    for l in links {
        out.push_str(&format!(
            "  <li><a href=\"{}\">{}</a></li>\n",
            escape(&l.url),
            escape(&l.title)
        ));
    }
    out.push_str("</ul>");
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sidebar {
    pub total_posts: usize,
    pub latest: String,
    pub most_commented: Vec<PostLink>,
}

impl Sidebar {
    pub fn from_catalog(catalog: &Catalog, latest: usize, most_commented: usize) -> Self {
        Self {
            total_posts: total_posts(catalog),
            latest: show_latest_posts(catalog, latest),
            most_commented: get_most_commented_posts(catalog, most_commented),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "<h2>My blog</h2>\n\
<p>This is my blog. I've written {n} posts so far.</p>\n\
<h3>Latest posts</h3>\n\
{latest}\n\
<h3>Most commented posts</h3>\n\
{most}",
            n = self.total_posts,
            latest = self.latest,
            most = link_list(&self.most_commented),
        )
    }
}
