use crate::forms::Form;
use crate::models::{Comment, Post, Tag};
use crate::pagination::Page;
use crate::urls::{reverse, POST_COMMENT, POST_LIST_BY_TAG, POST_SEARCH, POST_SHARE};

use super::base;
use super::filters::{escape, format_datetime, linebreaks, markdown, pluralize, truncatewords_html};
use super::tags::Sidebar;

/// Words kept from a post body in search results.
pub const SEARCH_EXCERPT_WORDS: usize = 12;
/// Words kept from a post body on the post list.
pub const LIST_EXCERPT_WORDS: usize = 30;

fn url_or_empty(name: &str, args: &[&dyn std::fmt::Display]) -> String {
    reverse(name, args).unwrap_or_default()
}

pub struct SearchContext<'a> {
    pub form: &'a Form,
    /// Present once a valid search was submitted.
    pub query: Option<&'a str>,
    pub results: &'a [&'a Post],
}

pub fn search(ctx: &SearchContext<'_>, sidebar: &Sidebar) -> String {
    let mut out = String::new();
    match ctx.query.filter(|q| !q.is_empty()) {
        Some(query) => {
            let total = ctx.results.len();
            out.push_str(&format!("<h1>Posts containing \"{}\"</h1>\n", escape(query)));
            out.push_str(&format!("<h3>Found {total} result{}</h3>\n", pluralize(total)));
            for post in ctx.results {
                out.push_str(&format!(
                    "<h4><a href=\"{}\">{}</a></h4>\n{}\n",
                    escape(&post.absolute_url()),
                    escape(&post.title),
                    truncatewords_html(&markdown(&post.body), SEARCH_EXCERPT_WORDS),
                ));
            }
            if ctx.results.is_empty() {
                out.push_str("<p>There are no results for your query.</p>\n");
            }
            out.push_str(&format!(
                "<p><a href=\"{}\">Search again</a></p>",
                escape(&url_or_empty(POST_SEARCH, &[]))
            ));
        }
        None => {
            out.push_str("<h1>Search for posts</h1>\n<form method=\"get\">\n");
            out.push_str(&ctx.form.as_p());
            out.push_str("\n<input type=\"submit\" value=\"Search\">\n</form>");
        }
    }
    base("Search", &out, sidebar)
}

fn tag_links(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| {
            format!(
                "<a href=\"{}\">{}</a>",
                escape(&url_or_empty(POST_LIST_BY_TAG, &[&t.slug])),
                escape(&t.name)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn pagination(page: &Page<Post>) -> String {
    let mut out = String::from("<div class=\"pagination\">\n<span class=\"step-links\">\n");
    if let Some(prev) = page.previous_page_number() {
        out.push_str(&format!("<a href=\"?page={prev}\">Previous</a>\n"));
    }
    out.push_str(&format!(
        "<span class=\"current\">Page {} of {}.</span>\n",
        page.number, page.num_pages
    ));
    if let Some(next) = page.next_page_number() {
        out.push_str(&format!("<a href=\"?page={next}\">Next</a>\n"));
    }
    out.push_str("</span>\n</div>");
    out
}

pub struct ListContext<'a> {
    pub page: &'a Page<Post>,
    pub tag: Option<&'a Tag>,
}

pub fn post_list(ctx: &ListContext<'_>, sidebar: &Sidebar) -> String {
    let mut out = String::from("<h1>My Blog</h1>\n");
    if let Some(tag) = ctx.tag {
        out.push_str(&format!("<h2>Posts tagged with \"{}\"</h2>\n", escape(&tag.name)));
    }
    for post in &ctx.page.items {
        out.push_str(&format!(
            "<h2><a href=\"{}\">{}</a></h2>\n",
            escape(&post.absolute_url()),
            escape(&post.title)
        ));
        out.push_str(&format!("<p class=\"tags\">Tags: {}</p>\n", tag_links(&post.tags)));
        out.push_str(&format!(
            "<p class=\"date\">Published {} by {}</p>\n",
            format_datetime(&post.publish),
            escape(&post.author)
        ));
        out.push_str(&truncatewords_html(&markdown(&post.body), LIST_EXCERPT_WORDS));
        out.push('\n');
    }
    out.push_str(&pagination(ctx.page));
    base("My Blog", &out, sidebar)
}

fn comment_form(post: &Post, form: &Form) -> String {
    format!(
        "<h2>Add a comment</h2>\n\
<form action=\"{action}\" method=\"post\">\n\
{fields}\n\
<p><input type=\"submit\" value=\"Add comment\"></p>\n\
</form>",
        action = escape(&url_or_empty(POST_COMMENT, &[&post.id])),
        fields = form.as_p(),
    )
}

pub struct DetailContext<'a> {
    pub post: &'a Post,
    pub comments: &'a [&'a Comment],
    pub form: &'a Form,
    pub similar_posts: &'a [&'a Post],
}

pub fn post_detail(ctx: &DetailContext<'_>, sidebar: &Sidebar) -> String {
    let post = ctx.post;
    let mut out = format!(
        "<h1>{}</h1>\n<p class=\"date\">Published {} by {}</p>\n{}\n",
        escape(&post.title),
        format_datetime(&post.publish),
        escape(&post.author),
        markdown(&post.body)
    );
    out.push_str(&format!(
        "<p><a href=\"{}\">Share this post</a></p>\n",
        escape(&url_or_empty(POST_SHARE, &[&post.id]))
    ));
    out.push_str("<h2>Similar posts</h2>\n");
    for similar in ctx.similar_posts {
        out.push_str(&format!(
            "<p><a href=\"{}\">{}</a></p>\n",
            escape(&similar.absolute_url()),
            escape(&similar.title)
        ));
    }
    if ctx.similar_posts.is_empty() {
        out.push_str("There are no similar posts yet.\n");
    }
    let total = ctx.comments.len();
    out.push_str(&format!("<h2>{total} comment{}</h2>\n", pluralize(total)));
    for (i, comment) in ctx.comments.iter().enumerate() {
        out.push_str(&format!(
            "<div class=\"comment\">\n<p class=\"info\">Comment {} by {} {}</p>\n{}\n</div>\n",
            i + 1,
            escape(&comment.name),
            format_datetime(&comment.created),
            linebreaks(&comment.body)
        ));
    }
    if ctx.comments.is_empty() {
        out.push_str("<p>There are no comments.</p>\n");
    }
    out.push_str(&comment_form(post, ctx.form));
    base(&post.title, &out, sidebar)
}

pub struct CommentContext<'a> {
    pub post: &'a Post,
    pub form: &'a Form,
    pub comment: Option<&'a Comment>,
}

pub fn post_comment(ctx: &CommentContext<'_>, sidebar: &Sidebar) -> String {
    let out = match ctx.comment {
        Some(_) => format!(
            "<h2>Your comment has been added.</h2>\n<p><a href=\"{}\">Back to the post</a></p>",
            escape(&ctx.post.absolute_url())
        ),
        None => comment_form(ctx.post, ctx.form),
    };
    base("Add a comment", &out, sidebar)
}

pub struct ShareContext<'a> {
    pub post: &'a Post,
    pub form: &'a Form,
    /// Recipient, once the mail went out.
    pub sent_to: Option<&'a str>,
}

pub fn post_share(ctx: &ShareContext<'_>, sidebar: &Sidebar) -> String {
    let out = match ctx.sent_to {
        Some(to) => format!(
            "<h1>E-mail successfully sent</h1>\n<p>\"{}\" was successfully sent to {}.</p>",
            escape(&ctx.post.title),
            escape(to)
        ),
        None => format!(
            "<h1>Share \"{}\" by e-mail</h1>\n<form method=\"post\">\n{}\n<input type=\"submit\" value=\"Send e-mail\">\n</form>",
            escape(&ctx.post.title),
            ctx.form.as_p()
        ),
    };
    base("Share a post", &out, sidebar)
}

pub fn not_found(sidebar: &Sidebar) -> String {
    base(
        "Page not found",
        "<h1>Not Found</h1>\n<p>The requested resource was not found on this server.</p>",
        sidebar,
    )
}
