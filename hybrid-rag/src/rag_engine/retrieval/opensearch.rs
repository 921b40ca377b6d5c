use async_trait::async_trait;
use reqwest::Client;
use sonic_rs::{JsonContainerTrait, JsonValueTrait, Value, json};
use tracing::debug;
use url::Url;

use crate::{
    rag_engine::{
        items::{Candidate, DocumentId},
        retrieval::LexicalRetriever,
        types::{RagError, RagResult},
    },
    rag_gateway::api::send_json,
};

/// Lexical retrieval backed by an OpenSearch `match` query on the `text`
/// field of an existing index.
pub struct OpenSearchRetriever {
    client: Client,
    search_url: String,
    credentials: Option<(String, String)>,
}

impl OpenSearchRetriever {
    pub fn new(url: &str, index: &str) -> RagResult<Self> {
        if index.is_empty() {
            return Err(RagError::InvalidConfiguration(
                "OpenSearch index name is empty".to_string(),
            ));
        }
        let base = Url::parse(url).map_err(|e| {
            RagError::InvalidConfiguration(format!("Invalid OpenSearch URL: {e}"))
        })?;

        Ok(Self {
            client: Client::new(),
            search_url: format!("{}/{index}/_search", base.as_str().trim_end_matches('/')),
            credentials: None,
        })
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }
}

/// Convert a `_search` response body into candidates, in hit order.
pub(crate) fn parse_hits(response: &Value) -> RagResult<Vec<Candidate>> {
    let hits = response["hits"]["hits"].as_array().ok_or_else(|| {
        RagError::LexicalRetrieval("Invalid hits format in OpenSearch response".to_string())
    })?;

    hits.iter()
        .map(|hit| {
            let id = hit["_id"].as_str().ok_or_else(|| {
                RagError::LexicalRetrieval("Missing `_id` in OpenSearch hit".to_string())
            })?;
            let text = hit["_source"]["text"].as_str().ok_or_else(|| {
                RagError::LexicalRetrieval(format!("Missing `_source.text` for hit `{id}`"))
            })?;
            let score = hit["_score"].as_f64().ok_or_else(|| {
                RagError::LexicalRetrieval(format!("Missing `_score` for hit `{id}`"))
            })?;
            Ok(Candidate::new(DocumentId::new(id), text, score))
        })
        .collect()
}

#[async_trait]
impl LexicalRetriever for OpenSearchRetriever {
    async fn search(&self, query: &str, k: usize) -> RagResult<Vec<Candidate>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.search_url).json(&json!({
            "size": k,
            "query": { "match": { "text": query } },
        }));
        if let Some((username, password)) = &self.credentials {
            request = request.basic_auth(username, Some(password));
        }

        let response = send_json(request, "OpenSearch", RagError::LexicalRetrieval).await?;
        let mut candidates = parse_hits(&response)?;
        candidates.truncate(k);

        debug!(hits = candidates.len(), "OpenSearch query returned");
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "opensearch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url() {
        let retriever = OpenSearchRetriever::new("http://localhost:9200/", "docs").unwrap();
        assert_eq!(retriever.search_url(), "http://localhost:9200/docs/_search");
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(OpenSearchRetriever::new("not a url", "docs").is_err());
        assert!(OpenSearchRetriever::new("http://localhost:9200", "").is_err());
    }

    #[test]
    fn test_parse_hits() {
        let body = r#"{
            "took": 3,
            "hits": {
                "total": {"value": 2},
                "hits": [
                    {"_id": "doc-1", "_score": 7.5, "_source": {"text": "first"}},
                    {"_id": "doc-9", "_score": 2.25, "_source": {"text": "second", "title": "x"}}
                ]
            }
        }"#;
        let response: Value = sonic_rs::from_str(body).unwrap();

        let candidates = parse_hits(&response).unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], Candidate::new("doc-1", "first", 7.5));
        assert_eq!(candidates[1], Candidate::new("doc-9", "second", 2.25));
    }

    #[test]
    fn test_parse_hits_without_text_fails() {
        let body = r#"{"hits": {"hits": [{"_id": "a", "_score": 1.0, "_source": {}}]}}"#;
        let response: Value = sonic_rs::from_str(body).unwrap();
        assert!(matches!(
            parse_hits(&response),
            Err(RagError::LexicalRetrieval(_))
        ));
    }

    #[test]
    fn test_parse_empty_hits() {
        let response: Value = sonic_rs::from_str(r#"{"hits": {"hits": []}}"#).unwrap();
        assert!(parse_hits(&response).unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore = "requires a running OpenSearch instance"]
    async fn test_search_live() {
        let retriever = OpenSearchRetriever::new("http://localhost:9200", "docs").unwrap();
        let results = retriever.search("hybrid retrieval", 5).await.unwrap();
        assert!(results.len() <= 5);
    }
}
