//! Second-stage reranking of fused candidates.

pub mod cross_encoder;
pub mod reranker;

pub use cross_encoder::{CrossEncoderConfig, CrossEncoderReranker};
pub use reranker::Reranker;
