use std::net::SocketAddr;

use anyhow::Result;
use blog_api::status::StatusCode;
use tracing::{error, info, warn};

use crate::forms::{CommentForm, EmailPostForm, SearchForm};
use crate::models::Post;
use crate::pagination::Paginator;
use crate::proto::http::{Request, Response};
use crate::site::Site;
use crate::sitemap;
use crate::templates::pages::{
    self, CommentContext, DetailContext, ListContext, SearchContext, ShareContext,
};

use super::util::{client_ip, html_response, last_param};

const SIMILAR_POSTS: usize = 4;

pub fn not_found(site: &Site) -> Response {
    html_response(StatusCode::NotFound, pages::not_found(&site.sidebar()))
}

pub fn post_list(site: &Site, req: &Request, tag_slug: Option<&str>) -> Result<Response> {
    let (posts, tag) = {
        let catalog = site.catalog();
        match tag_slug {
            Some(slug) => match catalog.tag(slug).cloned() {
                Some(tag) => {
                    let posts: Vec<Post> =
                        catalog.published_with_tag(slug).into_iter().cloned().collect();
                    (posts, Some(tag))
                }
                None => (Vec::new(), None),
            },
            None => (catalog.published().into_iter().cloned().collect(), None),
        }
    };
    if tag_slug.is_some() && tag.is_none() {
        return Ok(not_found(site));
    }
    let params = req.query_params();
    let paginator = Paginator::new(posts, site.config().posts_per_page);
    let page = paginator.page_or_fallback(last_param(&params, "page"));
    let html = pages::post_list(
        &ListContext {
            page: &page,
            tag: tag.as_ref(),
        },
        &site.sidebar(),
    );
    Ok(html_response(StatusCode::Ok, html))
}

pub fn post_detail(site: &Site, year: i64, month: i64, day: i64, slug: &str) -> Result<Response> {
    let sidebar = site.sidebar();
    let html = {
        let catalog = site.catalog();
        catalog
            .published_by_date_slug(year, month, day, slug)
            .map(|post| {
                let comments = catalog.active_comments(post.id);
                let similar = catalog.similar_posts(post, SIMILAR_POSTS);
                let form = CommentForm::unbound();
                pages::post_detail(
                    &DetailContext {
                        post,
                        comments: &comments,
                        form: &form.0,
                        similar_posts: &similar,
                    },
                    &sidebar,
                )
            })
    };
    match html {
        Some(html) => Ok(html_response(StatusCode::Ok, html)),
        None => Ok(not_found(site)),
    }
}

pub fn post_comment(site: &Site, req: &Request, post_id: i64, peer: Option<SocketAddr>) -> Result<Response> {
    let post = site.catalog().published_by_id(post_id).cloned();
    let Some(post) = post else {
        return Ok(not_found(site));
    };
    let form = CommentForm::bound(&req.form_params());
    let mut comment = None;
    if let Some(new) = form.comment() {
        if !site.allow_comment(client_ip(req, peer)) {
            warn!(target: "blogd::views", post = post_id, "comment rate limit hit");
            return Ok(Response::empty(StatusCode::TooManyRequests));
        }
        comment = site.add_comment(post_id, &new);
    }
    let html = pages::post_comment(
        &CommentContext {
            post: &post,
            form: &form.0,
            comment: comment.as_ref(),
        },
        &site.sidebar(),
    );
    Ok(html_response(StatusCode::Ok, html))
}

pub fn post_share(site: &Site, req: &Request, post_id: i64) -> Result<Response> {
    let post = site.catalog().published_by_id(post_id).cloned();
    let Some(post) = post else {
        return Ok(not_found(site));
    };
    let mut sent_to = None;
    let form = if req.method == "POST" {
        let form = EmailPostForm::bound(&req.form_params());
        if let Some(share) = form.share() {
            if let Err(e) = site.share_post(&post, &share) {
                error!(target: "blogd::views", post = post_id, "share failed: {e:#}");
                return Ok(Response::empty(StatusCode::InternalServerError));
            }
            sent_to = Some(share.to);
        }
        form
    } else {
        EmailPostForm::unbound()
    };
    let html = pages::post_share(
        &ShareContext {
            post: &post,
            form: &form.0,
            sent_to: sent_to.as_deref(),
        },
        &site.sidebar(),
    );
    Ok(html_response(StatusCode::Ok, html))
}

pub fn post_search(site: &Site, req: &Request) -> Result<Response> {
    let params = req.query_params();
    let mut form = SearchForm::unbound();
    let mut query = None;
    let mut results: Vec<Post> = Vec::new();

    if params.iter().any(|(k, _)| k == "query") {
        form = SearchForm::bound(&params);
        if let Some(q) = form.query() {
            query = Some(q.to_string());
            results = match site.search_titles(q) {
                Ok(found) => found.into_iter().map(|(p, _)| p).collect(),
                Err(e) => {
                    error!(target: "blogd::views", query = q, "search failed: {e:#}");
                    return Ok(Response::empty(StatusCode::InternalServerError));
                }
            };
            info!(target: "blogd::views", query = q, results = results.len(), "post search");
        }
    }

    let refs: Vec<&Post> = results.iter().collect();
    let html = pages::search(
        &SearchContext {
            form: &form.0,
            query: query.as_deref(),
            results: &refs,
        },
        &site.sidebar(),
    );
    Ok(html_response(StatusCode::Ok, html))
}

pub fn sitemap(site: &Site) -> Result<Response> {
    let xml = sitemap::render(&site.catalog(), &site.config().site_url)?;
    Ok(Response {
        code: StatusCode::Ok,
        headers: vec![("content-type".into(), "application/xml".into())],
        body: xml.into_bytes(),
    })
}
