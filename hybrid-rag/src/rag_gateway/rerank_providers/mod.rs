use async_trait::async_trait;
use reqwest::Client;
use sonic_rs::{JsonContainerTrait, JsonValueTrait, Value, json};
use url::Url;

use crate::rag_engine::types::{RagError, RagResult};
use crate::rag_gateway::api::{resolve_api_key, send_json};

/// A model that jointly scores (query, document) pairs.
///
/// Scores are on the model's own scale and are returned in the order of
/// `documents`.
#[async_trait]
pub trait RelevanceModel: Send + Sync {
    async fn score_pairs(&self, query: &str, documents: &[&str]) -> RagResult<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RerankProvider {
    Cohere,
    /// A text-embeddings-inference style `/rerank` endpoint.
    Local,
}

pub struct RelevanceModelImpl {
    pub(crate) provider: RerankProvider,
    api_key: Option<String>,
    client: Client,
    pub(crate) model: String,
    pub(crate) url: String,
}

impl RelevanceModelImpl {
    pub const DEFAULT_LOCAL_URL: &'static str = "http://localhost:8080/rerank";
    const COHERE_URL: &'static str = "https://api.cohere.com/v2/rerank";

    /// Model strings: `cohere:<model>` or `local`.
    pub fn new(api_key: Option<&str>, model: Option<&str>, url: Option<&str>) -> RagResult<Self> {
        let (provider, model_name) = Self::parse_provider_and_model(model)?;
        let (api_key, url) = match &provider {
            RerankProvider::Cohere => (
                Some(resolve_api_key(api_key, "COHERE_API_KEY")?),
                Self::COHERE_URL.to_string(),
            ),
            RerankProvider::Local => {
                let url_str = url.unwrap_or(Self::DEFAULT_LOCAL_URL);
                Url::parse(url_str).map_err(|e| {
                    RagError::InvalidConfiguration(format!("Invalid reranker URL: {e}"))
                })?;
                (None, url_str.to_string())
            }
        };

        Ok(RelevanceModelImpl {
            provider,
            api_key,
            client: Client::new(),
            model: model_name,
            url,
        })
    }

    pub(crate) fn parse_provider_and_model(
        model: Option<&str>,
    ) -> RagResult<(RerankProvider, String)> {
        match model {
            Some("local") => Ok((RerankProvider::Local, "local".to_string())),
            Some(m) if m.starts_with("cohere:") => {
                let model_name = m.strip_prefix("cohere:").unwrap_or_default();
                if model_name.is_empty() {
                    return Err(RagError::InvalidConfiguration(
                        "Cohere rerank model not specified".to_string(),
                    ));
                }
                Ok((RerankProvider::Cohere, model_name.to_string()))
            }
            Some(m) => Err(RagError::InvalidConfiguration(format!(
                "Unknown rerank provider in `{m}`"
            ))),
            None => Err(RagError::InvalidConfiguration(
                "No rerank provider available".to_string(),
            )),
        }
    }
}

/// Reassemble `{index, score}` entries into a score per input document.
///
/// Providers may return entries in relevance order rather than input
/// order; every input index must be present exactly once.
pub(crate) fn scores_by_index(
    entries: &Value,
    score_key: &str,
    expected: usize,
) -> RagResult<Vec<f64>> {
    let entries = entries.as_array().ok_or_else(|| {
        RagError::Reranker("Invalid result format in rerank response".to_string())
    })?;

    let mut scores: Vec<Option<f64>> = vec![None; expected];
    for entry in entries.iter() {
        let index = entry["index"].as_u64().ok_or_else(|| {
            RagError::Reranker("Missing `index` in rerank result".to_string())
        })? as usize;
        let score = entry[score_key].as_f64().ok_or_else(|| {
            RagError::Reranker(format!("Missing `{score_key}` in rerank result"))
        })?;
        match scores.get_mut(index) {
            Some(slot @ None) => *slot = Some(score),
            Some(Some(_)) => {
                return Err(RagError::Reranker(format!(
                    "Duplicate index {index} in rerank response"
                )));
            }
            None => {
                return Err(RagError::Reranker(format!(
                    "Index {index} out of range for {expected} documents"
                )));
            }
        }
    }

    scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| {
            score.ok_or_else(|| {
                RagError::Reranker(format!("No score returned for document {index}"))
            })
        })
        .collect()
}

#[async_trait]
impl RelevanceModel for RelevanceModelImpl {
    async fn score_pairs(&self, query: &str, documents: &[&str]) -> RagResult<Vec<f64>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        match &self.provider {
            RerankProvider::Cohere => {
                let api_key = self.api_key.as_ref().ok_or_else(|| {
                    RagError::Reranker("Cohere API key not set".to_string())
                })?;

                let request = self
                    .client
                    .post(&self.url)
                    .header("Authorization", format!("Bearer {api_key}"))
                    .json(&json!({
                        "model": &self.model,
                        "query": query,
                        "documents": documents,
                        "top_n": documents.len(),
                    }));

                let response = send_json(request, "Cohere", RagError::Reranker).await?;
                scores_by_index(&response["results"], "relevance_score", documents.len())
            }

            RerankProvider::Local => {
                let request = self.client.post(&self.url).json(&json!({
                    "query": query,
                    "texts": documents,
                    "raw_scores": false,
                }));

                let response = send_json(request, "Local", RagError::Reranker).await?;
                scores_by_index(&response, "score", documents.len())
            }
        }
    }
}

/// Creates a relevance model based on provider.
pub fn get_relevance_model(
    api_key: Option<&str>,
    model: Option<&str>,
    url: Option<&str>,
) -> RagResult<RelevanceModelImpl> {
    RelevanceModelImpl::new(api_key, model, url)
}
