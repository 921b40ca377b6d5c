//! Shared plumbing for the HTTP model and search providers.

use std::env;

use reqwest::RequestBuilder;
use sonic_rs::{JsonContainerTrait, JsonValueTrait, Value};

use crate::rag_engine::types::{RagError, RagResult};

/// Constructor of the error variant a provider reports through.
pub(crate) type ErrorKind = fn(String) -> RagError;

/// Build a descriptive message from an API error response.
///
/// Understands the common shapes: `{"error": {"message"}}` (OpenAI),
/// `{"error": {"reason"}}` (OpenSearch), `{"message"}` (Cohere) and
/// `{"error": "..."}`. Falls back to a truncated raw body.
pub(crate) fn parse_api_error(provider: &str, status: u16, body: &str) -> String {
    if let Ok(json) = sonic_rs::from_str::<Value>(body) {
        let message = json["error"]["message"]
            .as_str()
            .or_else(|| json["error"]["reason"].as_str())
            .or_else(|| json["message"].as_str())
            .or_else(|| json["error"].as_str());
        if let Some(message) = message {
            return format!("{provider} API error ({status}): {message}");
        }
    }

    let truncated_body = if body.chars().count() > 200 {
        format!("{}...", body.chars().take(200).collect::<String>())
    } else {
        body.to_string()
    };
    format!("{provider} API error ({status}): {truncated_body}")
}

/// Send a request and decode a successful JSON response body.
pub(crate) async fn send_json(
    request: RequestBuilder,
    provider: &str,
    kind: ErrorKind,
) -> RagResult<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| kind(format!("Failed to send request to {provider}: {e}")))?;

    // Save status before consuming response body
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| kind(format!("Failed to read {provider} response: {e}")))?;

    if !status.is_success() {
        return Err(kind(parse_api_error(provider, status.as_u16(), &body)));
    }

    sonic_rs::from_str::<Value>(&body)
        .map_err(|e| kind(format!("Failed to parse {provider} response: {e}")))
}

/// Read a numeric array out of a provider response.
pub(crate) fn f64_array(value: &Value, what: &str, kind: ErrorKind) -> RagResult<Vec<f64>> {
    value
        .as_array()
        .ok_or_else(|| kind(format!("Invalid {what} format in response")))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| kind(format!("Invalid float value in {what}")))
        })
        .collect()
}

/// An explicit key wins over the environment variable.
pub(crate) fn resolve_api_key(explicit: Option<&str>, var: &str) -> RagResult<String> {
    explicit
        .map(String::from)
        .or_else(|| env::var(var).ok())
        .ok_or_else(|| RagError::InvalidConfiguration(format!("{var} not set")))
}
