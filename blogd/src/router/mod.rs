use std::net::SocketAddr;

use anyhow::Result;
use blog_api::status::StatusCode;
use tracing::debug;

use crate::proto::http::{Request, Response};
use crate::site::Site;
use crate::urls::{
    API_SEARCH, HEALTH_READY, POST_COMMENT, POST_DETAIL, POST_LIST, POST_LIST_BY_TAG, POST_SEARCH,
    POST_SHARE, SITEMAP, STATIC, URLCONF,
};

mod api;
mod assets;
mod util;
mod views;

pub fn handle(site: &Site, req: Request) -> Result<Response> {
    handle_with_peer(site, req, None)
}

pub fn handle_with_peer(site: &Site, req: Request, peer: Option<SocketAddr>) -> Result<Response> {
    let path = util::percent_decode(req.path_only());
    let Some(m) = URLCONF.resolve(&path) else {
        debug!(target: "blogd::router", %path, "no route");
        return Ok(views::not_found(site));
    };

    let allowed = match m.url_name.as_str() {
        POST_COMMENT => "POST",
        POST_SHARE => "GET, POST",
        _ => "GET",
    };
    if !allowed.split(", ").any(|method| method == req.method) {
        return Ok(Response {
            code: StatusCode::MethodNotAllowed,
            headers: vec![("allow".into(), allowed.into())],
            body: vec![],
        });
    }

    match m.url_name.as_str() {
        POST_LIST => views::post_list(site, &req, None),
        POST_LIST_BY_TAG => views::post_list(site, &req, m.get("tag_slug")),
        POST_DETAIL => match (m.get_int("year"), m.get_int("month"), m.get_int("day"), m.get("post")) {
            (Some(y), Some(mo), Some(d), Some(slug)) => views::post_detail(site, y, mo, d, slug),
            _ => Ok(views::not_found(site)),
        },
        POST_COMMENT => match m.get_int("post_id") {
            Some(id) => views::post_comment(site, &req, id, peer),
            None => Ok(views::not_found(site)),
        },
        POST_SHARE => match m.get_int("post_id") {
            Some(id) => views::post_share(site, &req, id),
            None => Ok(views::not_found(site)),
        },
        POST_SEARCH => views::post_search(site, &req),
        SITEMAP => views::sitemap(site),
        API_SEARCH => api::handle_search(site, &req),
        HEALTH_READY => Ok(util::json_response(
            StatusCode::Ok,
            b"{\"status\":\"ready\"}".to_vec(),
        )),
        STATIC => assets::serve(site, m.get("path").unwrap_or("")),
        _ => Ok(views::not_found(site)),
    }
}
