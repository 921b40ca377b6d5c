use async_trait::async_trait;
use reqwest::Client;
use sonic_rs::{JsonValueTrait, Value, json};
use url::Url;

use crate::rag_engine::types::{RagError, RagResult};
use crate::rag_gateway::api::{resolve_api_key, send_json};

/// Trait for language models that complete a prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> RagResult<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum LlmProvider {
    OpenAI,
    /// Any server speaking the OpenAI chat completions protocol.
    Local,
}

pub struct LlmModelImpl {
    pub(crate) provider: LlmProvider,
    api_key: Option<String>,
    client: Client,
    pub(crate) model: String,
    pub(crate) url: String,
    pub(crate) max_tokens: u32,
    pub(crate) temperature: f64,
}

impl LlmModelImpl {
    pub const DEFAULT_LOCAL_URL: &'static str = "http://localhost:8000/v1/chat/completions";
    const OPENAI_URL: &'static str = "https://api.openai.com/v1/chat/completions";

    /// Model strings: `openai:<model>` or `local[:<model>]`.
    pub fn new(api_key: Option<&str>, model: Option<&str>, url: Option<&str>) -> RagResult<Self> {
        let (provider, model_name) = Self::parse_provider_and_model(model)?;
        let (api_key, url) = match &provider {
            LlmProvider::OpenAI => (
                Some(resolve_api_key(api_key, "OPENAI_API_KEY")?),
                Self::OPENAI_URL.to_string(),
            ),
            LlmProvider::Local => {
                let url_str = url.unwrap_or(Self::DEFAULT_LOCAL_URL);
                Url::parse(url_str).map_err(|e| {
                    RagError::InvalidConfiguration(format!("Invalid language model URL: {e}"))
                })?;
                (api_key.map(String::from), url_str.to_string())
            }
        };

        Ok(LlmModelImpl {
            provider,
            api_key,
            client: Client::new(),
            model: model_name,
            url,
            max_tokens: 512,
            temperature: 0.0,
        })
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub(crate) fn parse_provider_and_model(model: Option<&str>) -> RagResult<(LlmProvider, String)> {
        match model {
            Some("local") => Ok((LlmProvider::Local, "default".to_string())),
            Some(m) if m.starts_with("local:") => {
                let model_name = m.strip_prefix("local:").unwrap_or_default();
                Ok((LlmProvider::Local, model_name.to_string()))
            }
            Some(m) if m.starts_with("openai:") => {
                let model_name = m.strip_prefix("openai:").unwrap_or_default();
                if model_name.is_empty() {
                    return Err(RagError::InvalidConfiguration(
                        "OpenAI language model not specified".to_string(),
                    ));
                }
                Ok((LlmProvider::OpenAI, model_name.to_string()))
            }
            Some(m) => Err(RagError::InvalidConfiguration(format!(
                "Unknown language model provider in `{m}`"
            ))),
            None => Err(RagError::InvalidConfiguration(
                "No language model provider available".to_string(),
            )),
        }
    }

    fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Local => "Local",
        }
    }
}

/// Pull the first choice's message out of a chat completions response.
pub(crate) fn completion_text(response: &Value) -> RagResult<String> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.trim().to_string())
        .ok_or_else(|| {
            RagError::Generation("Invalid completion format in language model response".to_string())
        })
}

#[async_trait]
impl LanguageModel for LlmModelImpl {
    async fn complete(&self, prompt: &str) -> RagResult<String> {
        let mut request = self.client.post(&self.url).json(&json!({
            "model": &self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        }));

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = send_json(request, self.provider_name(), RagError::Generation).await?;
        completion_text(&response)
    }
}

/// Creates a language model based on provider.
pub fn get_language_model(
    api_key: Option<&str>,
    model: Option<&str>,
    url: Option<&str>,
) -> RagResult<LlmModelImpl> {
    LlmModelImpl::new(api_key, model, url)
}
