use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rag_engine::{
    fusion::FusionMethod,
    types::{RagError, RagResult},
};

/// Cutoffs and deadline for one pipeline. Read-only once the pipeline is
/// built, so it is shared freely across concurrent queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidates requested from each retriever, and the size of the fused set.
    #[serde(default = "default_retrieve_k")]
    pub retrieve_k: usize,
    /// Candidates kept after reranking and passed to generation.
    #[serde(default = "default_rerank_k")]
    pub rerank_k: usize,
    /// Whole-query deadline in milliseconds. `None` waits indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub fusion: FusionMethod,
}

fn default_retrieve_k() -> usize {
    PipelineConfig::DEFAULT_RETRIEVE_K
}

fn default_rerank_k() -> usize {
    PipelineConfig::DEFAULT_RERANK_K
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retrieve_k: Self::DEFAULT_RETRIEVE_K,
            rerank_k: Self::DEFAULT_RERANK_K,
            timeout_ms: None,
            fusion: FusionMethod::default(),
        }
    }
}

impl PipelineConfig {
    pub const DEFAULT_RETRIEVE_K: usize = 20;
    pub const DEFAULT_RERANK_K: usize = 10;

    pub fn new(retrieve_k: usize, rerank_k: usize) -> Self {
        Self {
            retrieve_k,
            rerank_k,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn with_fusion(mut self, fusion: FusionMethod) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> RagResult<()> {
        if self.retrieve_k == 0 {
            return Err(RagError::InvalidParameter(
                "retrieve_k must be greater than 0".to_string(),
            ));
        }
        if self.rerank_k == 0 {
            return Err(RagError::InvalidParameter(
                "rerank_k must be greater than 0".to_string(),
            ));
        }
        if self.timeout_ms == Some(0) {
            return Err(RagError::InvalidParameter(
                "timeout must be greater than 0".to_string(),
            ));
        }
        self.fusion.validate()?;

        if self.rerank_k > self.retrieve_k {
            warn!(
                retrieve_k = self.retrieve_k,
                rerank_k = self.rerank_k,
                "rerank_k exceeds retrieve_k, reranker will never see more than retrieve_k candidates"
            );
        }
        Ok(())
    }
}
