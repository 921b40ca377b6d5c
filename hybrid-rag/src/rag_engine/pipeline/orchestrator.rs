//! Sequences retrieval, fusion, reranking and generation for one question.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use crate::rag_engine::{
    fusion::fuse_with,
    generation::Generator,
    items::{Candidate, PipelineResult},
    pipeline::config::PipelineConfig,
    reranker::Reranker,
    retrieval::{LexicalRetriever, VectorRetriever},
    types::{RagError, RagResult, Stage},
};

/// An assembled answer pipeline.
///
/// Immutable after [`PipelineBuilder::build`]; `run` takes `&self`, so
/// one instance behind an `Arc` serves any number of concurrent queries.
pub struct Pipeline {
    lexical: Arc<dyn LexicalRetriever>,
    vector: Arc<dyn VectorRetriever>,
    reranker: Arc<dyn Reranker>,
    generator: Arc<dyn Generator>,
    config: PipelineConfig,
}

#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    lexical: Option<Arc<dyn LexicalRetriever>>,
    vector: Option<Arc<dyn VectorRetriever>>,
    reranker: Option<Arc<dyn Reranker>>,
    generator: Option<Arc<dyn Generator>>,
}

impl PipelineBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn lexical<R: LexicalRetriever + 'static>(mut self, retriever: R) -> Self {
        self.lexical = Some(Arc::new(retriever));
        self
    }

    pub fn vector<R: VectorRetriever + 'static>(mut self, retriever: R) -> Self {
        self.vector = Some(Arc::new(retriever));
        self
    }

    pub fn reranker<R: Reranker + 'static>(mut self, reranker: R) -> Self {
        self.reranker = Some(Arc::new(reranker));
        self
    }

    pub fn generator<G: Generator + 'static>(mut self, generator: G) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    pub fn build(self) -> RagResult<Pipeline> {
        self.config.validate()?;

        let missing = |what: &str| {
            RagError::InvalidConfiguration(format!("pipeline has no {what} configured"))
        };

        Ok(Pipeline {
            lexical: self.lexical.ok_or_else(|| missing("lexical retriever"))?,
            vector: self.vector.ok_or_else(|| missing("vector retriever"))?,
            reranker: self.reranker.ok_or_else(|| missing("reranker"))?,
            generator: self.generator.ok_or_else(|| missing("generator"))?,
            config: self.config,
        })
    }
}

/// Run `stage` to completion, or fail once `deadline` passes.
async fn within<T, F>(
    deadline: Option<(Instant, Duration)>,
    stage: Stage,
    future: F,
) -> RagResult<T>
where
    F: Future<Output = RagResult<T>>,
{
    let result = match deadline {
        Some((at, timeout)) => match timeout_at(at, future).await {
            Ok(result) => result,
            Err(_) => Err(RagError::Timeout { stage, timeout }),
        },
        None => future.await,
    };

    if let Err(e) = &result {
        warn!(%stage, error = %e, "Pipeline stage failed");
    }
    result
}

impl Pipeline {
    pub fn builder(config: PipelineConfig) -> PipelineBuilder {
        PipelineBuilder::new(config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Answer `question` from retrieved evidence.
    ///
    /// Both retrievers are queried concurrently and both must finish
    /// before fusion starts. Empty result sets flow through every stage;
    /// the generator decides what an answer without evidence looks like.
    /// Any collaborator error aborts the query unchanged.
    pub async fn run(&self, question: &str) -> RagResult<PipelineResult> {
        let started = Instant::now();
        let deadline = self.config.timeout().map(|t| (started + t, t));
        let PipelineConfig {
            retrieve_k,
            rerank_k,
            fusion,
            ..
        } = self.config;

        let (sparse, dense) = within(deadline, Stage::Retrieval, async {
            tokio::try_join!(
                self.lexical.search(question, retrieve_k),
                self.vector.search(question, retrieve_k),
            )
        })
        .await?;
        debug!(
            lexical = self.lexical.name(),
            vector = self.vector.name(),
            sparse = sparse.len(),
            dense = dense.len(),
            "Retrieval complete"
        );

        let fused = within(deadline, Stage::Fusion, async {
            fuse_with(fusion, &sparse, &dense, retrieve_k)
        })
        .await?;
        let fused_count = fused.len();
        debug!(fused = fused_count, "Fusion complete");

        let candidates: Vec<Candidate> = fused.into_iter().map(Candidate::from).collect();
        let reranked = within(deadline, Stage::Rerank, async {
            let reranked = self.reranker.rerank(question, candidates, rerank_k).await?;
            if reranked.len() > rerank_k {
                return Err(RagError::Reranker(format!(
                    "{} returned {} candidates, limit is {rerank_k}",
                    self.reranker.name(),
                    reranked.len()
                )));
            }
            Ok(reranked)
        })
        .await?;
        debug!(reranker = self.reranker.name(), kept = reranked.len(), "Rerank complete");

        let result = within(
            deadline,
            Stage::Generation,
            self.generator.generate(question, &reranked),
        )
        .await?;

        info!(
            sparse = sparse.len(),
            dense = dense.len(),
            fused = fused_count,
            reranked = reranked.len(),
            sources = result.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answered query"
        );
        Ok(result)
    }
}
