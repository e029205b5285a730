pub mod catalog;
pub mod config;
pub mod forms;
pub mod mail;
pub mod models;
pub mod pagination;
pub mod proto;
pub mod router;
pub mod search;
pub mod seed;
pub mod services;
pub mod site;
pub mod sitemap;
pub mod startup;
pub mod storage;
pub mod templates;
pub mod urls;

pub use blog_index as index;
pub use blog_query as query;
