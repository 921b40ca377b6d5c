//! Cross-encoder reranking.
//!
//! Cross-encoders jointly encode query-document pairs, which scores
//! relevance more accurately than comparing separate embeddings. The
//! scoring itself is delegated to a [`RelevanceModel`] backend.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    rag_engine::{
        items::Candidate,
        reranker::reranker::Reranker,
        types::{RagError, RagResult},
    },
    rag_gateway::rerank_providers::RelevanceModel,
};

/// Configuration for cross-encoder reranking.
#[derive(Debug, Clone)]
pub struct CrossEncoderConfig {
    /// Model identifier (e.g., "bge-reranker-base")
    pub model_name: String,

    /// Pairs sent to the model per request
    pub batch_size: usize,

    /// Document text is cut to this many characters before scoring
    pub max_length: Option<usize>,
}

impl CrossEncoderConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            batch_size: 32,
            max_length: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

pub struct CrossEncoderReranker<M: RelevanceModel> {
    pub config: CrossEncoderConfig,
    model: M,
}

impl<M: RelevanceModel> CrossEncoderReranker<M> {
    pub fn new(config: CrossEncoderConfig, model: M) -> RagResult<Self> {
        if config.batch_size == 0 {
            return Err(RagError::InvalidParameter(
                "cross-encoder batch size must be greater than 0".to_string(),
            ));
        }
        Ok(Self { config, model })
    }

    fn model_input<'a>(&self, text: &'a str) -> &'a str {
        match self.config.max_length {
            Some(max) => match text.char_indices().nth(max) {
                Some((cut, _)) => &text[..cut],
                None => text,
            },
            None => text,
        }
    }

    async fn score(&self, query: &str, candidates: &[Candidate]) -> RagResult<Vec<f64>> {
        let mut scores = Vec::with_capacity(candidates.len());
        for batch in candidates.chunks(self.config.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| self.model_input(&c.text)).collect();
            let batch_scores = self.model.score_pairs(query, &texts).await?;
            if batch_scores.len() != batch.len() {
                return Err(RagError::Reranker(format!(
                    "{} returned {} scores for {} documents",
                    self.config.model_name,
                    batch_scores.len(),
                    batch.len()
                )));
            }
            scores.extend(batch_scores);
        }
        Ok(scores)
    }
}

#[async_trait]
impl<M: RelevanceModel> Reranker for CrossEncoderReranker<M> {
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_k: usize,
    ) -> RagResult<Vec<Candidate>> {
        if candidates.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let scores = self.score(query, &candidates).await?;
        if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
            return Err(RagError::Reranker(format!(
                "{} produced non-finite score {bad}",
                self.config.model_name
            )));
        }

        let mut reranked: Vec<Candidate> = candidates
            .into_iter()
            .zip(scores)
            .map(|(candidate, score)| Candidate { score, ..candidate })
            .collect();

        reranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        reranked.truncate(top_k);

        debug!(
            model = %self.config.model_name,
            kept = reranked.len(),
            "Cross-encoder rerank complete"
        );
        Ok(reranked)
    }

    fn name(&self) -> &str {
        "cross-encoder"
    }
}
