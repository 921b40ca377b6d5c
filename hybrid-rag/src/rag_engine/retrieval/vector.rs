use std::{fs, path::Path};

use async_trait::async_trait;
use itertools::Itertools;
use serde::Deserialize;
use tracing::debug;

use crate::{
    rag_engine::{
        items::{Candidate, DocumentId},
        retrieval::VectorRetriever,
        types::{RagError, RagResult},
    },
    rag_gateway::embedding_providers::EmbeddingModel,
};

/// A document with a precomputed embedding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddedDocument {
    pub id: DocumentId,
    pub text: String,
    pub embedding: Vec<f64>,
}

/// Cosine similarity in `[-1, 1]`. Zero-norm vectors score 0.
pub fn cosine_similarity(from: &[f64], to: &[f64]) -> RagResult<f64> {
    if from.len() != to.len() {
        return Err(RagError::VectorRetrieval(format!(
            "embedding dimension mismatch: {} vs {}",
            from.len(),
            to.len()
        )));
    }

    let (dot, norm_from, norm_to) = from
        .iter()
        .zip(to)
        .fold((0.0, 0.0, 0.0), |(dot, nf, nt), (a, b)| {
            (dot + a * b, nf + a * a, nt + b * b)
        });

    if norm_from == 0.0 || norm_to == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_from.sqrt() * norm_to.sqrt()))
}

/// Brute-force dense retrieval: embed the query, score every stored
/// document by cosine similarity, keep the top `k`.
pub struct EmbeddingVectorRetriever<E: EmbeddingModel> {
    embedder: E,
    documents: Vec<EmbeddedDocument>,
}

impl<E: EmbeddingModel> EmbeddingVectorRetriever<E> {
    pub fn new(embedder: E, documents: Vec<EmbeddedDocument>) -> RagResult<Self> {
        if let Some(first) = documents.first() {
            let dimension = first.embedding.len();
            if let Some(bad) = documents.iter().find(|d| d.embedding.len() != dimension) {
                return Err(RagError::VectorRetrieval(format!(
                    "document `{}` has dimension {}, expected {dimension}",
                    bad.id,
                    bad.embedding.len()
                )));
            }
        }
        Ok(Self { embedder, documents })
    }

    /// Load documents from a JSON Lines file of `{"id", "text", "embedding"}`
    /// records. `id` may be a string or an integer.
    pub fn from_jsonl(embedder: E, path: impl AsRef<Path>) -> RagResult<Self> {
        let contents = fs::read_to_string(path)?;
        let documents = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(sonic_rs::from_str::<EmbeddedDocument>)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(documents = documents.len(), "Loaded embedded documents");
        Self::new(embedder, documents)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[async_trait]
impl<E: EmbeddingModel> VectorRetriever for EmbeddingVectorRetriever<E> {
    async fn search(&self, query: &str, k: usize) -> RagResult<Vec<Candidate>> {
        if k == 0 || self.documents.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .fetch_embedding(query)
            .await
            .map_err(|e| RagError::VectorRetrieval(e.to_string()))?;

        let scored = self
            .documents
            .iter()
            .map(|doc| cosine_similarity(&doc.embedding, &query_embedding).map(|s| (doc, s)))
            .collect::<RagResult<Vec<_>>>()?;

        Ok(scored
            .into_iter()
            .sorted_by(|(_, a), (_, b)| b.total_cmp(a))
            .take(k)
            .map(|(doc, score)| Candidate {
                document_id: doc.id.clone(),
                text: doc.text.clone(),
                score,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "embedding"
    }
}
