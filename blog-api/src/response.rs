#[cfg(feature = "json")]
use serde::Serialize;

/// One post in a JSON search response.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize))]
pub struct SearchResultItem {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize))]
pub struct SearchResponse {
    pub query: String,
    pub total: u64,
    pub results: Vec<SearchResultItem>,
}
