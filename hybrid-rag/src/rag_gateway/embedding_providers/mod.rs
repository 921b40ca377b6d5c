use async_trait::async_trait;
use reqwest::Client;
use sonic_rs::json;
use url::Url;

use crate::rag_engine::types::{RagError, RagResult};
use crate::rag_gateway::api::{f64_array, resolve_api_key, send_json};

/// Trait for embedding models to fetch text embeddings.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn fetch_embedding(&self, text: &str) -> RagResult<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingProvider {
    OpenAI,
    Local,
}

pub struct EmbeddingModelImpl {
    pub(crate) provider: EmbeddingProvider,
    api_key: Option<String>,
    client: Client,
    pub(crate) model: String,
    pub(crate) url: Option<String>,
}

impl EmbeddingModelImpl {
    pub const DEFAULT_LOCAL_URL: &'static str = "http://localhost:8699/embed";
    const OPENAI_URL: &'static str = "https://api.openai.com/v1/embeddings";

    /// Model strings: `openai:<model>`, a bare OpenAI model name, or `local`.
    pub fn new(api_key: Option<&str>, model: Option<&str>, url: Option<&str>) -> RagResult<Self> {
        let (provider, model_name) = Self::parse_provider_and_model(model)?;
        let api_key = match &provider {
            EmbeddingProvider::OpenAI => Some(resolve_api_key(api_key, "OPENAI_API_KEY")?),
            EmbeddingProvider::Local => None,
        };

        let url = match &provider {
            EmbeddingProvider::Local => {
                let url_str = url.unwrap_or(Self::DEFAULT_LOCAL_URL);
                Url::parse(url_str).map_err(|e| {
                    RagError::InvalidConfiguration(format!("Invalid embedding URL: {e}"))
                })?;
                Some(url_str.to_string())
            }
            EmbeddingProvider::OpenAI => None,
        };

        Ok(EmbeddingModelImpl {
            provider,
            api_key,
            client: Client::new(),
            model: model_name,
            url,
        })
    }

    pub(crate) fn parse_provider_and_model(
        model: Option<&str>,
    ) -> RagResult<(EmbeddingProvider, String)> {
        match model {
            Some("local") => Ok((EmbeddingProvider::Local, "local".to_string())),
            Some(m) if m.starts_with("openai:") => {
                let model_name = m.strip_prefix("openai:").unwrap_or_default();
                if model_name.is_empty() {
                    return Err(RagError::InvalidConfiguration(
                        "OpenAI embedding model not specified".to_string(),
                    ));
                }
                Ok((EmbeddingProvider::OpenAI, model_name.to_string()))
            }
            Some(m) if m.contains(':') => Err(RagError::InvalidConfiguration(format!(
                "Unknown embedding provider in `{m}`"
            ))),
            Some(m) if !m.is_empty() => Ok((EmbeddingProvider::OpenAI, m.to_string())),
            _ => Err(RagError::InvalidConfiguration(
                "No embedding provider available".to_string(),
            )),
        }
    }
}

#[async_trait]
impl EmbeddingModel for EmbeddingModelImpl {
    async fn fetch_embedding(&self, text: &str) -> RagResult<Vec<f64>> {
        match &self.provider {
            EmbeddingProvider::OpenAI => {
                let api_key = self.api_key.as_ref().ok_or_else(|| {
                    RagError::Embedding("OpenAI API key not set".to_string())
                })?;

                let request = self
                    .client
                    .post(Self::OPENAI_URL)
                    .header("Authorization", format!("Bearer {api_key}"))
                    .json(&json!({
                        "input": text,
                        "model": &self.model,
                    }));

                let response = send_json(request, "OpenAI", RagError::Embedding).await?;
                f64_array(&response["data"][0]["embedding"], "embedding", RagError::Embedding)
            }

            EmbeddingProvider::Local => {
                let url = self.url.as_ref().ok_or_else(|| {
                    RagError::Embedding("Local embedding URL not set".to_string())
                })?;

                let request = self.client.post(url).json(&json!({ "text": text }));

                let response = send_json(request, "Local", RagError::Embedding).await?;
                f64_array(&response["embedding"], "embedding", RagError::Embedding)
            }
        }
    }
}

/// Creates an embedding model based on provider.
pub fn get_embedding_model(
    api_key: Option<&str>,
    model: Option<&str>,
    url: Option<&str>,
) -> RagResult<EmbeddingModelImpl> {
    EmbeddingModelImpl::new(api_key, model, url)
}
