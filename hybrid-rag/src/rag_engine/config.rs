//! File configuration for a deployed pipeline (`rag.toml`).

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::rag_engine::{
    pipeline::PipelineConfig,
    types::{RagError, RagResult},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub lexical: LexicalConfig,
    pub vector: VectorConfig,
    pub reranker: RerankerConfig,
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "0.0.0.0:6969".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LexicalConfig {
    /// In-memory BM25 over a one-document-per-line corpus file.
    Bm25 { corpus_path: String },
    OpenSearch {
        url: String,
        index: String,
        /// Password is read from `OPENSEARCH_PASSWORD`.
        #[serde(default)]
        username: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// JSON Lines file of `{"id", "text", "embedding"}` records.
    pub documents_path: String,
    /// `openai:<model>` or `local`.
    pub embedding_model: String,
    #[serde(default)]
    pub embedding_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    /// `cohere:<model>` or `local`.
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub max_length: Option<usize>,
}

fn default_batch_size() -> usize {
    32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// `openai:<model>`, `local` or `local:<model>`.
    pub model: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl RagConfig {
    pub fn from_file(path: &Path) -> RagResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RagError::InvalidConfiguration(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: RagConfig = toml::from_str(&content).map_err(|e| {
            RagError::InvalidConfiguration(format!("Failed to parse {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RagResult<()> {
        self.pipeline.validate()?;

        if self.server.address.is_empty() {
            return Err(RagError::InvalidConfiguration(
                "server address cannot be empty".to_string(),
            ));
        }

        match &self.lexical {
            LexicalConfig::Bm25 { corpus_path } if corpus_path.is_empty() => {
                return Err(RagError::InvalidConfiguration(
                    "bm25 corpus_path cannot be empty".to_string(),
                ));
            }
            LexicalConfig::OpenSearch { url, index, .. } if url.is_empty() || index.is_empty() => {
                return Err(RagError::InvalidConfiguration(
                    "opensearch url and index must be set".to_string(),
                ));
            }
            _ => {}
        }

        if self.vector.documents_path.is_empty() {
            return Err(RagError::InvalidConfiguration(
                "vector documents_path cannot be empty".to_string(),
            ));
        }
        if self.reranker.batch_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "reranker batch_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
