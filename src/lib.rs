//! ShopRank: e-commerce product search
//!
//! A request flows through query understanding, category classification,
//! tiered multi-source retrieval, e-commerce filtering, relevance scoring
//! and rank fusion before being paginated into a `SearchResultPage`.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod classify;
pub mod cli;
pub mod config;
pub mod errors;
pub mod extract;
pub mod filter;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod query;
pub mod rerank;
pub mod retrieval;
pub mod scoring;

#[cfg(test)]
mod config_tests;

pub use config::AppConfig;
pub use errors::*;
pub use pipeline::PipelineContext;
pub use pipeline::SearchPipeline;
