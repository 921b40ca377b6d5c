//! Core Reranker trait.

use async_trait::async_trait;

use crate::rag_engine::{items::Candidate, types::RagResult};

/// Reorders candidates by relevance to a query.
///
/// Implementations take ownership of the candidate list and return at
/// most `top_k` of them ordered by descending score. The scale of the
/// returned scores is the reranker's own.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> RagResult<Vec<Candidate>>;

    /// Get the name of this reranker for debugging/logging
    fn name(&self) -> &str;
}
