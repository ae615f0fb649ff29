pub mod config;
pub mod crawler;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod graph_store;
pub mod loader;
pub mod memory_graph;
pub mod metrics;
pub mod pagination;
pub mod pipeline;
pub mod table_parser;
pub mod types;
pub mod utils;
