pub mod cache;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod filter;
pub mod output;
pub mod routes;
pub mod tracker;
