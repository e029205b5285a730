use anyhow::Result;
use blog_api::response::{SearchResponse, SearchResultItem};
use blog_api::status::StatusCode;
use blog_query::parse_query;
use tracing::{error, info};

use crate::proto::http::{Request, Response};
use crate::search::normalize_key;
use crate::site::Site;

use super::util::{json_response, last_param};

/// `GET /api/search?query=…` as JSON, cached per normalized query.
pub fn handle_search(site: &Site, req: &Request) -> Result<Response> {
    let params = req.query_params();
    let q = last_param(&params, "query").unwrap_or("").trim().to_string();
    if q.is_empty() {
        return Ok(Response::empty(StatusCode::BadRequest));
    }

    let key = normalize_key(&parse_query(&q));
    if let Some(hit) = site.cache().get(&key) {
        let body = serde_json::to_vec(&hit)?;
        return Ok(json_response(StatusCode::Ok, body));
    }

    let found = match site.search(&q) {
        Ok(found) => found,
        Err(e) => {
            error!(target: "blogd::api", query = %q, "search failed: {e:#}");
            return Ok(Response::empty(StatusCode::InternalServerError));
        }
    };
    let results: Vec<SearchResultItem> = found
        .into_iter()
        .map(|(post, score)| SearchResultItem {
            id: post.id,
            url: post.absolute_url(),
            title: post.title,
            score,
        })
        .collect();
    let resp = SearchResponse {
        query: q,
        total: results.len() as u64,
        results,
    };
    info!(target: "blogd::api", query = %resp.query, total = resp.total, "api search");
    site.cache().put(key, resp.clone());
    let body = serde_json::to_vec(&resp)?;
    Ok(json_response(StatusCode::Ok, body))
}
