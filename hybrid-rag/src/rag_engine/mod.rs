pub mod config;
pub mod fusion;
pub mod generation;
pub mod items;
pub mod pipeline;
pub mod reranker;
pub mod retrieval;
pub mod types;
